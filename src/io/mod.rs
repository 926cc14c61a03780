//! Sheet ingestion: header normalisation for merged cells and a delimited
//! text reader producing a [`RawTable`](crate::data_structs::RawTable).
mod header;
mod sheet;

pub use header::{
    is_placeholder,
    normalize_headers,
};
pub use sheet::{
    read_sheet,
    read_sheet_path,
};
