use crate::core::models::pipeline::{PipelineSpec, PipelineSpecError, StageSpec};
use std::path::PathBuf;

pub const DEFAULT_GMX_EXECUTABLE: &str = "gmx";
pub const TOPOLOGY_FILE: &str = "topol.top";

/// Parameters of the built-in solvate / neutralise / minimise / equilibrate / produce protocol.
///
/// The parameter files `ions.mdp`, `minim.mdp`, `nvt.mdp`, `npt.mdp` and
/// `md.mdp` are looked up in `mdp_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct GromacsParams {
    pub gmx: String,
    pub force_field: String,
    pub water_model: String,
    pub box_distance_nm: f64,
    pub positive_ion: String,
    pub negative_ion: String,
    pub solvent_group: String,
    pub mdp_dir: PathBuf,
}

impl GromacsParams {
    pub fn new(mdp_dir: impl Into<PathBuf>) -> Self {
        Self {
            gmx: DEFAULT_GMX_EXECUTABLE.to_string(),
            force_field: "amber99sb-ildn".to_string(),
            water_model: "tip3p".to_string(),
            box_distance_nm: 1.0,
            positive_ion: "NA".to_string(),
            negative_ion: "CL".to_string(),
            solvent_group: "SOL".to_string(),
            mdp_dir: mdp_dir.into(),
        }
    }

    fn mdp(&self, name: &str) -> String {
        self.mdp_dir.join(name).to_string_lossy().into_owned()
    }

    fn stage(&self, name: &str, args: &[&str], output: &str) -> StageSpec {
        StageSpec {
            name: name.to_string(),
            program: self.gmx.clone(),
            args: args.iter().map(|a| a.to_string()).collect(),
            output: output.to_string(),
            stdin: None,
        }
    }

    fn grompp(&self, name: &str, mdp: &str, output: &str, restrained: bool) -> StageSpec {
        let mdp = self.mdp(mdp);
        let mut args = vec!["grompp", "-f", mdp.as_str(), "-c", "{input}"];
        if restrained {
            args.extend(["-r", "{input}"]);
        }
        args.extend(["-p", TOPOLOGY_FILE, "-o", "{output}", "-maxwarn", "1"]);
        self.stage(name, &args, output)
    }

    fn mdrun(&self, name: &str, deffnm: &str) -> StageSpec {
        let output = format!("{deffnm}.gro");
        self.stage(
            name,
            &["mdrun", "-s", "{input}", "-deffnm", deffnm, "-c", "{output}"],
            &output,
        )
    }

    pub fn md_pipeline(&self) -> Result<PipelineSpec, PipelineSpecError> {
        let distance = self.box_distance_nm.to_string();
        let mut genion = self.stage(
            "genion",
            &[
                "genion",
                "-s",
                "{input}",
                "-o",
                "{output}",
                "-p",
                TOPOLOGY_FILE,
                "-pname",
                self.positive_ion.as_str(),
                "-nname",
                self.negative_ion.as_str(),
                "-neutral",
            ],
            "ionized.gro",
        );
        genion.stdin = Some(format!("{}\n", self.solvent_group));

        PipelineSpec::new(vec![
            self.stage(
                "pdb2gmx",
                &[
                    "pdb2gmx",
                    "-f",
                    "{input}",
                    "-o",
                    "{output}",
                    "-p",
                    TOPOLOGY_FILE,
                    "-ff",
                    self.force_field.as_str(),
                    "-water",
                    self.water_model.as_str(),
                    "-ignh",
                ],
                "processed.gro",
            ),
            self.stage(
                "editconf",
                &[
                    "editconf", "-f", "{input}", "-o", "{output}", "-c", "-d", distance.as_str(), "-bt",
                    "cubic",
                ],
                "boxed.gro",
            ),
            self.stage(
                "solvate",
                &[
                    "solvate",
                    "-cp",
                    "{input}",
                    "-cs",
                    "spc216.gro",
                    "-o",
                    "{output}",
                    "-p",
                    TOPOLOGY_FILE,
                ],
                "solvated.gro",
            ),
            self.grompp("grompp-ions", "ions.mdp", "ions.tpr", false),
            genion,
            self.grompp("grompp-em", "minim.mdp", "em.tpr", false),
            self.mdrun("mdrun-em", "em"),
            self.grompp("grompp-nvt", "nvt.mdp", "nvt.tpr", true),
            self.mdrun("mdrun-nvt", "nvt"),
            self.grompp("grompp-npt", "npt.mdp", "npt.tpr", true),
            self.mdrun("mdrun-npt", "npt"),
            self.grompp("grompp-md", "md.mdp", "md.tpr", false),
            self.mdrun("mdrun-md", "md"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_protocol_has_thirteen_ordered_stages() {
        let spec = GromacsParams::new("/mdp").md_pipeline().unwrap();
        let names: Vec<&str> = spec.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "pdb2gmx",
                "editconf",
                "solvate",
                "grompp-ions",
                "genion",
                "grompp-em",
                "mdrun-em",
                "grompp-nvt",
                "mdrun-nvt",
                "grompp-npt",
                "mdrun-npt",
                "grompp-md",
                "mdrun-md"
            ]
        );
    }

    #[test]
    fn genion_receives_solvent_group_on_stdin() {
        let spec = GromacsParams::new("/mdp").md_pipeline().unwrap();
        let genion = &spec.stages()[4];
        assert_eq!(genion.stdin.as_deref(), Some("SOL\n"));
        assert!(genion.args.contains(&"-neutral".to_string()));
    }

    #[test]
    fn restrained_grompp_passes_reference_coordinates() {
        let spec = GromacsParams::new("/mdp").md_pipeline().unwrap();
        let nvt = &spec.stages()[7];
        assert_eq!(&nvt.args[1..3], ["-f".to_string(), "/mdp/nvt.mdp".to_string()]);
        assert!(nvt.args.windows(2).any(|w| w[0] == "-r" && w[1] == "{input}"));
        let em = &spec.stages()[5];
        assert!(!em.args.contains(&"-r".to_string()));
    }

    #[test]
    fn mdrun_writes_named_coordinates() {
        let spec = GromacsParams::new("/mdp").md_pipeline().unwrap();
        let last = spec.stages().last().unwrap();
        assert_eq!(last.output, "md.gro");
        assert_eq!(last.program, "gmx");
    }
}
