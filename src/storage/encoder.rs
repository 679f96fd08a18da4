//! Bulk heap file encoder.
//!
//! Converts rows (in memory or from delimited text) straight into heap
//! file pages without going through the buffer pool. Rows fill slots in
//! order and a page is emitted each time it fills, so the output is
//! byte-identical to inserting the same rows one by one into an empty
//! table with the same page size.

use crate::error::{DbError, Result};
use crate::page::{PageLayout, SlotBitmap};
use crate::tuple::{codec, TupleDesc};
use crate::types::{Field, Type};
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Accumulates rows for the page currently being filled
struct PageBuilder {
    layout: PageLayout,
    data: Vec<u8>,
    header: SlotBitmap,
    count: usize,
}

impl PageBuilder {
    fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            data: vec![0u8; layout.page_size],
            header: SlotBitmap::new(layout.slots),
            count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.count == self.layout.slots
    }

    fn push(&mut self, desc: &TupleDesc, fields: &[Field]) -> Result<()> {
        let offset = self.layout.slot_offset(self.count);
        codec::encode_fields(desc, fields, &mut self.data[offset..offset + self.layout.tuple_size])?;
        self.header.set(self.count, true);
        self.count += 1;
        Ok(())
    }

    /// Write the finished page and reset for the next one
    fn flush<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.header.write(&mut self.data);
        out.write_all(&self.data)?;
        *self = Self::new(self.layout);
        Ok(())
    }
}

/// Offline converter from rows to heap file bytes
pub struct HeapFileEncoder {
    desc: Arc<TupleDesc>,
    layout: PageLayout,
    separator: char,
}

impl HeapFileEncoder {
    /// Create an encoder for `desc` using the database page size
    pub fn new(desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        let layout = PageLayout::new(page_size, &desc);
        if layout.slots == 0 {
            return Err(DbError::invalid_config(format!(
                "page size {} cannot hold a single {}-byte tuple",
                page_size,
                desc.byte_size()
            )));
        }
        Ok(Self {
            desc,
            layout,
            separator: ',',
        })
    }

    /// Field separator for text input (default `,`)
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Encode rows into pages written to `out`.
    ///
    /// Returns the number of pages written. Empty input still produces a
    /// single empty page.
    pub fn encode_rows<W, I>(&self, rows: I, out: &mut W) -> Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = Vec<Field>>,
    {
        self.encode(rows.into_iter().map(Ok), out)
    }

    /// Parse delimited text (one row per line) and encode it.
    ///
    /// Blank lines are skipped; carriage returns are ignored; text fields
    /// are trimmed and truncated to the maximum text length.
    pub fn encode_text<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> Result<usize> {
        let rows = input
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Ok(line) => {
                    let line = line.replace('\r', "");
                    if line.trim().is_empty() {
                        None
                    } else {
                        Some(self.parse_line(index + 1, &line))
                    }
                }
                Err(e) => Some(Err(DbError::from(e))),
            });
        self.encode(rows, out)
    }

    /// Convert a delimited text file into a heap file at `out_path`
    pub fn convert_file(&self, in_path: &Path, out_path: &Path) -> Result<usize> {
        let input = BufReader::new(File::open(in_path)?);
        let mut out = BufWriter::new(File::create(out_path)?);
        let pages = self.encode_text(input, &mut out)?;
        out.flush()?;
        info!(
            "encoded {} into {} page(s) at {}",
            in_path.display(),
            pages,
            out_path.display()
        );
        Ok(pages)
    }

    fn encode<W, I>(&self, rows: I, out: &mut W) -> Result<usize>
    where
        W: Write,
        I: Iterator<Item = Result<Vec<Field>>>,
    {
        let mut page = PageBuilder::new(self.layout);
        let mut pages = 0;
        for row in rows {
            page.push(&self.desc, &row?)?;
            if page.is_full() {
                page.flush(out)?;
                pages += 1;
            }
        }
        if page.count > 0 || pages == 0 {
            page.flush(out)?;
            pages += 1;
        }
        Ok(pages)
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<Vec<Field>> {
        let parts: Vec<&str> = line.split(self.separator).collect();
        if parts.len() != self.desc.num_fields() {
            return Err(DbError::Parse {
                line: line_no,
                message: format!(
                    "expected {} fields, found {}",
                    self.desc.num_fields(),
                    parts.len()
                ),
            });
        }

        parts
            .iter()
            .zip(self.desc.types())
            .map(|(raw, ty)| match ty {
                Type::Int => raw.trim().parse::<i32>().map(Field::Int).map_err(|e| DbError::Parse {
                    line: line_no,
                    message: format!("bad integer {:?}: {}", raw.trim(), e),
                }),
                Type::Text => Ok(Field::Text(codec::truncate_text(raw.trim()).to_string())),
            })
            .collect()
    }
}
