mod pre0015;
mod pre0029;
mod predatabase;

mod convert;
pub(crate) use convert::convert_cache;
pub(crate) use predatabase::migrate_json_to_database;
