pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;

pub use builder::{
    build_aggregate_config, build_analysis_config, build_array_config, build_convert_config,
    build_disorder_config, build_job_spec, build_pipeline_config, load_file_config,
    resolve_config_path,
};
pub use file::FileConfig;
pub use models::GlobalOptions;
