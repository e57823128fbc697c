// document constants
pub const DOC_ID: &str = "_id";
pub const RESERVED_FIELDS: [&str; 1] = [DOC_ID];

// query operators
pub const OP_EQ: &str = "$eq";
pub const OP_NE: &str = "$ne";
pub const OP_GT: &str = "$gt";
pub const OP_GTE: &str = "$gte";
pub const OP_LT: &str = "$lt";
pub const OP_LTE: &str = "$lte";
pub const OP_IN: &str = "$in";
pub const OP_NIN: &str = "$nin";
pub const OP_EXISTS: &str = "$exists";
pub const OP_REGEX: &str = "$regex";
pub const OP_OPTIONS: &str = "$options";
pub const OP_ELEM_MATCH: &str = "$elemMatch";
pub const OP_NOT: &str = "$not";
pub const OP_AND: &str = "$and";
pub const OP_OR: &str = "$or";
pub const OP_NOR: &str = "$nor";
pub const OP_TEXT: &str = "$text";
pub const OP_SEARCH: &str = "$search";

// pseudo field used to match scalar array elements
pub const ELEMENT_FIELD: &str = "$";

// update operators
pub const OP_SET: &str = "$set";
pub const OP_INC: &str = "$inc";
pub const OP_RENAME: &str = "$rename";
pub const OP_UNSET: &str = "$unset";

// index constants
pub const UNIQUE_INDEX: &str = "unique";
pub const NON_UNIQUE_INDEX: &str = "non-unique";
pub const TEXT_INDEX: &str = "text";
pub const ID_INDEX_NAME: &str = "_id_";
pub const INDEX_NAME_SEPARATOR: &str = "_";

// config defaults
pub const DEFAULT_FIELD_SEPARATOR: &str = ".";

pub const LITEDOC_VERSION: &str = env!("CARGO_PKG_VERSION");
