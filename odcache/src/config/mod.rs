mod dimension_info;
mod odc_build_configuration;
mod source_format;

pub use dimension_info::DimensionInfo;
pub use odc_build_configuration::OdcBuildConfiguration;
pub use source_format::SourceFormat;
