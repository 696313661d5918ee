//! Property keys used in the JSON property bag of internal elements.

pub const NAME: &str = "name";
pub const FULL_NAME: &str = "full_name";
pub const COMMENT: &str = "comment";
pub const STORAGE_ROOT: &str = "storage_root";
pub const STORAGE_LOCATION: &str = "storage_location";
pub const TABLE_TYPE: &str = "table_type";
pub const DATA_SOURCE_FORMAT: &str = "data_source_format";
pub const VOLUME_TYPE: &str = "volume_type";
pub const DATA_TYPE: &str = "data_type";
pub const FULL_DATA_TYPE: &str = "full_data_type";
pub const ROUTINE_BODY: &str = "routine_body";
pub const ROUTINE_DEFINITION: &str = "routine_definition";
pub const LANGUAGE: &str = "language";
pub const IS_DETERMINISTIC: &str = "is_deterministic";
pub const TYPE_TEXT: &str = "type_text";
pub const TYPE_NAME: &str = "type_name";
pub const POSITION: &str = "position";
pub const NULLABLE: &str = "nullable";
/// Free-form string properties copied from the catalog entity.
pub const ADDITIONAL_PROPERTIES: &str = "additional_properties";
/// Network address of the catalog server (set on the server element).
pub const ENDPOINT: &str = "endpoint";
