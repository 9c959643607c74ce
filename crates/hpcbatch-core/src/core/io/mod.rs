//! Provides input/output functionality for the file formats exchanged with the
//! external tools.
//!
//! Readers share the [`traits::RecordFile`] interface. Formats the tools consume
//! as opaque byte streams are only parsed as far as a workflow needs: the first
//! sequence length of a FASTA file, the B-factor column of a PDB file, the
//! assignment lines of STRIDE output.

pub mod af3;
pub mod fasta;
pub mod iupred;
pub mod pdb;
pub mod stride;
pub mod traits;
