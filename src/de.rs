//! Deserializes decoded rows into user types
//!
//! A [`Row`] is seen as a sequence of cell values in column order, so it
//! fills tuples, tuple structs and structs (fields taken in declaration
//! order).
//!
//! # Example
//!
//! ```no_run
//! use sheetstream::{open_workbook, Reader};
//!
//! #[derive(serde_derive::Deserialize)]
//! struct Sale(String, f64, Option<u32>);
//!
//! let workbook = open_workbook("sales.xls").expect("cannot open file");
//! for row in workbook.row_iter(0, 1, None).expect("cannot read sheet") {
//!     let Sale(label, amount, _) = row.deserialize().expect("bad row");
//!     println!("{label}: {amount}");
//! }
//! ```

use std::fmt;
use std::slice;

use serde::de::{self, DeserializeSeed, IntoDeserializer, SeqAccess, Visitor};
use serde::{forward_to_deserialize_any, Deserializer};

use crate::datatype::{CellErrorType, Data};
use crate::row::{Cell, Row};

/// A row deserialization error
#[derive(Debug)]
pub enum DeError {
    /// The cell holds an error value
    CellError {
        /// Error value
        err: CellErrorType,
        /// Cell position (row, column)
        pos: (u32, u32),
    },
    /// Serde specific error
    Custom(String),
}

impl fmt::Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeError::CellError { err, pos } => {
                write!(f, "Cell error at position '{pos:?}': {err}")
            }
            DeError::Custom(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for DeError {}

impl de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DeError::Custom(msg.to_string())
    }
}

/// Feeds the cells of a row, in column order, to a sequence visitor
pub struct RowDeserializer<'a> {
    cells: slice::Iter<'a, Cell>,
    row: u32,
}

impl<'a> RowDeserializer<'a> {
    /// Deserializer over the cells of `row`
    pub fn new(row: &'a Row) -> RowDeserializer<'a> {
        RowDeserializer {
            cells: row.iter(),
            row: row.index(),
        }
    }
}

impl<'de, 'a> Deserializer<'de> for RowDeserializer<'a> {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string bytes
        byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

impl<'de, 'a> SeqAccess<'de> for RowDeserializer<'a> {
    type Error = DeError;

    fn next_element_seed<S>(&mut self, seed: S) -> Result<Option<S::Value>, DeError>
    where
        S: DeserializeSeed<'de>,
    {
        match self.cells.next() {
            Some(cell) => {
                let pos = (self.row, cell.column().unwrap_or_default());
                seed.deserialize(CellDeserializer::new(cell.value(), pos))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.cells.len())
    }
}

macro_rules! deserialize_num {
    ($typ:ty, $method:ident, $visit:ident) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value, DeError>
        where
            V: Visitor<'de>,
        {
            match self.data {
                Data::Float(v) => visitor.$visit(*v as $typ),
                Data::Int(v) => visitor.$visit(*v as $typ),
                Data::String(s) => {
                    let v = s.trim().parse().map_err(|_| {
                        DeError::Custom(format!("Expecting {}, got '{s}'", stringify!($typ)))
                    })?;
                    visitor.$visit(v)
                }
                Data::Error(err) => Err(self.error(*err)),
                d => Err(DeError::Custom(format!(
                    "Expecting {}, got {d:?}",
                    stringify!($typ)
                ))),
            }
        }
    };
}

/// Deserializer of a single cell value
pub struct CellDeserializer<'a> {
    data: &'a Data,
    pos: (u32, u32),
}

impl<'a> CellDeserializer<'a> {
    /// Deserializer of `data`, `pos` being reported in errors
    pub fn new(data: &'a Data, pos: (u32, u32)) -> CellDeserializer<'a> {
        CellDeserializer { data, pos }
    }

    fn error(&self, err: CellErrorType) -> DeError {
        DeError::CellError { err, pos: self.pos }
    }
}

impl<'de, 'a> Deserializer<'de> for CellDeserializer<'a> {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.data {
            Data::String(v) => visitor.visit_str(v),
            Data::Float(v) => visitor.visit_f64(*v),
            Data::Bool(v) => visitor.visit_bool(*v),
            Data::Int(v) => visitor.visit_i64(*v),
            Data::Empty => visitor.visit_unit(),
            Data::Error(err) => Err(self.error(*err)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.data {
            Data::Error(err) => Err(self.error(*err)),
            Data::String(v) => visitor.visit_str(v),
            d => visitor.visit_string(d.to_string()),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.data {
            Data::Bool(v) => visitor.visit_bool(*v),
            Data::String(v) => match v.as_str() {
                "TRUE" | "true" | "True" => visitor.visit_bool(true),
                "FALSE" | "false" | "False" => visitor.visit_bool(false),
                d => Err(DeError::Custom(format!("Expecting bool, got '{d}'"))),
            },
            Data::Empty => visitor.visit_bool(false),
            Data::Float(v) => visitor.visit_bool(*v != 0.),
            Data::Int(v) => visitor.visit_bool(*v != 0),
            Data::Error(err) => Err(self.error(*err)),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.data {
            Data::Empty => visitor.visit_unit(),
            Data::Error(err) => Err(self.error(*err)),
            d => Err(DeError::Custom(format!("Expecting unit, got {d:?}"))),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.data {
            Data::Empty => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.data {
            Data::String(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            Data::Error(err) => Err(self.error(*err)),
            d => Err(DeError::Custom(format!("Expecting enum, got {d:?}"))),
        }
    }

    deserialize_num!(i64, deserialize_i64, visit_i64);
    deserialize_num!(i32, deserialize_i32, visit_i32);
    deserialize_num!(i16, deserialize_i16, visit_i16);
    deserialize_num!(i8, deserialize_i8, visit_i8);
    deserialize_num!(u64, deserialize_u64, visit_u64);
    deserialize_num!(u32, deserialize_u32, visit_u32);
    deserialize_num!(u16, deserialize_u16, visit_u16);
    deserialize_num!(u8, deserialize_u8, visit_u8);
    deserialize_num!(f64, deserialize_f64, visit_f64);
    deserialize_num!(f32, deserialize_f32, visit_f32);

    forward_to_deserialize_any! {
        char bytes byte_buf unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}
