pub mod catalog;
pub mod import;
pub mod registry;
pub mod validate;

pub use catalog::{CatalogFormat, CatalogSource, WeaponCatalog, WeaponSelection};
pub use import::{
    load_catalog, parse_csv_catalog, parse_json_catalog, parse_yaml_catalog, CatalogError,
    DEFAULT_CATALOG_PATH, LEVEL_KEYS,
};
pub use registry::CatalogHandle;
pub use validate::{validate_spec, ValidationDiagnostic, ValidationReport, ValidationSeverity};
