//! Marker substrings the label workflows rely on.

pub const LOGICAL_IDENTIFIER: &str = "<logical_identifier>";
pub const VERSION_ID: &str = "<version_id>";
pub const MODIFICATION_DATE: &str = "<modification_date>";
pub const MODIFICATION_HISTORY: &str = "<Modification_History>";
pub const START_DATE_TIME: &str = "<start_date_time>";
pub const STOP_DATE_TIME: &str = "<stop_date_time>";
pub const FILE_NAME: &str = "<file_name>";
pub const LOCAL_IDENTIFIER: &str = "<local_identifier>";
pub const CREATION_DATE_TIME: &str = "<creation_date_time>";
pub const MD5_CHECKSUM: &str = "<md5_checksum>";
pub const FILE_SIZE: &str = "<file_size unit=\"byte\">";
pub const RECORD_LENGTH: &str = "<record_length unit=\"byte\">";
pub const RECORDS: &str = "<records>";
pub const OFFSET: &str = "<offset unit=\"byte\">";
pub const GROUPS: &str = "<groups>";
pub const COMMENT: &str = "<comment>";
