mod tables;

pub use tables::{Column, ColumnType, DistStyle, Table, TableDef};
