use crate::core::io::fasta::{FastaRecord, clean_sequence};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const AF3_DIALECT: &str = "alphafold3";
pub const AF3_VERSION: u32 = 1;

/// AlphaFold3 JSON input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Af3Input {
    pub name: String,
    pub sequences: Vec<Af3Entity>,
    pub model_seeds: Vec<u32>,
    pub dialect: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Af3Entity {
    Protein(Af3Protein),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Af3Protein {
    pub id: Vec<String>,
    pub sequence: String,
}

impl Af3Input {
    /// Builds a document with one protein chain per record, chains lettered A, B, ...
    pub fn from_records(name: &str, records: &[FastaRecord], model_seeds: &[u32]) -> Self {
        let sequences = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                Af3Entity::Protein(Af3Protein {
                    id: vec![chain_id(i)],
                    sequence: clean_sequence(&record.sequence),
                })
            })
            .collect();

        Self {
            name: name.to_string(),
            sequences,
            model_seeds: model_seeds.to_vec(),
            dialect: AF3_DIALECT.to_string(),
            version: AF3_VERSION,
        }
    }

    pub fn chain_ids(&self) -> Vec<&str> {
        self.sequences
            .iter()
            .filter_map(|entity| match entity {
                Af3Entity::Protein(p) => p.id.first().map(String::as_str),
            })
            .collect()
    }

    pub fn write_to(&self, writer: &mut impl Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n").map_err(serde_json::Error::io)
    }

    pub fn write_to_path(&self, path: &Path) -> serde_json::Result<()> {
        let file = File::create(path).map_err(serde_json::Error::io)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(serde_json::Error::io)
    }
}

/// Spreadsheet-style chain identifier: 0 → `A`, 25 → `Z`, 26 → `AA`, 27 → `AB`.
pub fn chain_id(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
