//! Link-data record codec.
//!
//! A link-data file holds one tab-separated line per simulated time point. Two
//! fixed layouts exist and a study uses exactly one of them:
//!
//! ```text
//! legacy: direct  indirect  field3  field4  field5
//! modern: direct  indirect  field3  field4  field5  field6  field7  field8
//! ```
//!
//! Capacities are written in fixed notation with six decimals, the integer
//! columns without a decimal point. Decoding then encoding a well-formed line
//! gives the same line back, except that the two capacities are normalised to
//! six decimals.

use crate::error::{XpnError, XpnResult};
use crate::version::FormatVersion;

/// Column separator used by link-data files.
pub const LINKDATA_SEPARATOR: &str = "\t";

/// Number of decimals written for the capacity columns.
pub const CAPACITY_DECIMALS: usize = 6;

/// Trailing columns of a record, tagged by layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTail {
    /// No columns after field5.
    Legacy,
    /// Columns 6 to 8 of the modern layout.
    Modern { field6: i64, field7: i64, field8: i64 },
}

impl RecordTail {
    fn empty(format: FormatVersion) -> Self {
        match format {
            FormatVersion::Legacy => RecordTail::Legacy,
            FormatVersion::Modern => RecordTail::Modern {
                field6: 0,
                field7: 0,
                field8: 0,
            },
        }
    }
}

/// One line of a link-data file.
///
/// Only the two capacities can change after construction; the other columns
/// are carried through [`update_capacities`](Self::update_capacities) and
/// [`reset`](Self::reset) as they are (or zeroed, for `reset`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityRecord {
    direct_capacity: f64,
    indirect_capacity: f64,
    field3: i64,
    field4: i64,
    field5: i64,
    tail: RecordTail,
}

impl CapacityRecord {
    /// All-zero record in the given layout.
    pub fn empty(format: FormatVersion) -> Self {
        Self {
            direct_capacity: 0.0,
            indirect_capacity: 0.0,
            field3: 0,
            field4: 0,
            field5: 0,
            tail: RecordTail::empty(format),
        }
    }

    /// Record in the 5-column layout.
    pub fn legacy(
        direct_capacity: f64,
        indirect_capacity: f64,
        field3: i64,
        field4: i64,
        field5: i64,
    ) -> Self {
        Self {
            direct_capacity,
            indirect_capacity,
            field3,
            field4,
            field5,
            tail: RecordTail::Legacy,
        }
    }

    /// Record in the 8-column layout.
    #[allow(clippy::too_many_arguments)]
    pub fn modern(
        direct_capacity: f64,
        indirect_capacity: f64,
        field3: i64,
        field4: i64,
        field5: i64,
        field6: i64,
        field7: i64,
        field8: i64,
    ) -> Self {
        Self {
            direct_capacity,
            indirect_capacity,
            field3,
            field4,
            field5,
            tail: RecordTail::Modern {
                field6,
                field7,
                field8,
            },
        }
    }

    /// Parse one line under `format`.
    ///
    /// Legacy decoding needs at least 5 columns and ignores anything after the
    /// 5th. Modern decoding needs exactly 8. Capacities are parsed as finite
    /// floats, every other column as an integer; whitespace around a column
    /// (a trailing `\r` included) is ignored.
    pub fn decode(line: &str, format: FormatVersion) -> XpnResult<Self> {
        let columns: Vec<&str> = line.split(LINKDATA_SEPARATOR).collect();
        match format {
            FormatVersion::Legacy if columns.len() < 5 => {
                return Err(XpnError::malformed(
                    line,
                    format!("expected at least 5 fields, found {}", columns.len()),
                ));
            }
            FormatVersion::Modern if columns.len() != 8 => {
                return Err(XpnError::malformed(
                    line,
                    format!("expected 8 fields, found {}", columns.len()),
                ));
            }
            _ => {}
        }

        let tail = match format {
            FormatVersion::Legacy => RecordTail::Legacy,
            FormatVersion::Modern => RecordTail::Modern {
                field6: parse_integer(line, columns[5], 6)?,
                field7: parse_integer(line, columns[6], 7)?,
                field8: parse_integer(line, columns[7], 8)?,
            },
        };

        Ok(Self {
            direct_capacity: parse_capacity(line, columns[0], 1)?,
            indirect_capacity: parse_capacity(line, columns[1], 2)?,
            field3: parse_integer(line, columns[2], 3)?,
            field4: parse_integer(line, columns[3], 4)?,
            field5: parse_integer(line, columns[4], 5)?,
            tail,
        })
    }

    /// Render the record with `separator` between columns.
    pub fn to_row(&self, separator: &str) -> String {
        let mut row = format!(
            "{direct:.prec$}{sep}{indirect:.prec$}{sep}{f3}{sep}{f4}{sep}{f5}",
            direct = self.direct_capacity,
            indirect = self.indirect_capacity,
            f3 = self.field3,
            f4 = self.field4,
            f5 = self.field5,
            sep = separator,
            prec = CAPACITY_DECIMALS,
        );
        if let RecordTail::Modern {
            field6,
            field7,
            field8,
        } = self.tail
        {
            row.push_str(&format!(
                "{sep}{field6}{sep}{field7}{sep}{field8}",
                sep = separator
            ));
        }
        row
    }

    /// Render the record as a link-data line (no line terminator).
    pub fn encode(&self) -> String {
        self.to_row(LINKDATA_SEPARATOR)
    }

    /// Same record with new capacities; every other column is kept.
    #[must_use]
    pub fn update_capacities(self, direct_capacity: f64, indirect_capacity: f64) -> Self {
        Self {
            direct_capacity,
            indirect_capacity,
            ..self
        }
    }

    /// All-zero record in the same layout.
    #[must_use]
    pub fn reset(self) -> Self {
        Self::empty(self.format())
    }

    pub fn format(&self) -> FormatVersion {
        match self.tail {
            RecordTail::Legacy => FormatVersion::Legacy,
            RecordTail::Modern { .. } => FormatVersion::Modern,
        }
    }

    pub fn is_modern(&self) -> bool {
        self.format().is_modern()
    }

    pub fn direct_capacity(&self) -> f64 {
        self.direct_capacity
    }

    pub fn indirect_capacity(&self) -> f64 {
        self.indirect_capacity
    }

    pub fn field3(&self) -> i64 {
        self.field3
    }

    pub fn field4(&self) -> i64 {
        self.field4
    }

    pub fn field5(&self) -> i64 {
        self.field5
    }

    /// Column 6; always 0 for legacy records.
    pub fn field6(&self) -> i64 {
        match self.tail {
            RecordTail::Legacy => 0,
            RecordTail::Modern { field6, .. } => field6,
        }
    }

    /// Column 7; always 0 for legacy records.
    pub fn field7(&self) -> i64 {
        match self.tail {
            RecordTail::Legacy => 0,
            RecordTail::Modern { field7, .. } => field7,
        }
    }

    /// Column 8; always 0 for legacy records.
    pub fn field8(&self) -> i64 {
        match self.tail {
            RecordTail::Legacy => 0,
            RecordTail::Modern { field8, .. } => field8,
        }
    }

    pub fn tail(&self) -> RecordTail {
        self.tail
    }
}

fn parse_capacity(line: &str, column: &str, position: usize) -> XpnResult<f64> {
    let value: f64 = column.trim().parse().map_err(|_| {
        XpnError::malformed(line, format!("field {position} is not a number: {column:?}"))
    })?;
    if !value.is_finite() {
        return Err(XpnError::malformed(
            line,
            format!("field {position} is not finite: {column:?}"),
        ));
    }
    Ok(value)
}

fn parse_integer(line: &str, column: &str, position: usize) -> XpnResult<i64> {
    column.trim().parse().map_err(|_| {
        XpnError::malformed(
            line,
            format!("field {position} is not an integer: {column:?}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_fields(record: &CapacityRecord, expected: (f64, f64, [i64; 6])) {
        assert_eq!(record.direct_capacity(), expected.0);
        assert_eq!(record.indirect_capacity(), expected.1);
        assert_eq!(
            [
                record.field3(),
                record.field4(),
                record.field5(),
                record.field6(),
                record.field7(),
                record.field8(),
            ],
            expected.2
        );
    }

    #[test]
    fn legacy_constructor_has_no_trailing_columns() {
        let record = CapacityRecord::legacy(1000.0, 500.0, 1, 1, 1);
        assert!(!record.is_modern());
        assert_fields(&record, (1000.0, 500.0, [1, 1, 1, 0, 0, 0]));

        let blank = record.reset();
        assert!(!blank.is_modern());
        assert_fields(&blank, (0.0, 0.0, [0; 6]));
    }

    #[test]
    fn modern_constructor_keeps_all_columns() {
        let record = CapacityRecord::modern(1000.0, 500.0, 1, 1, 1, 1, 1, 1);
        assert!(record.is_modern());
        assert_fields(&record, (1000.0, 500.0, [1; 6]));

        let blank = record.reset();
        assert!(blank.is_modern());
        assert_fields(&blank, (0.0, 0.0, [0; 6]));
    }

    #[test]
    fn empty_records_are_zero() {
        for format in [FormatVersion::Legacy, FormatVersion::Modern] {
            let record = CapacityRecord::empty(format);
            assert_eq!(record.format(), format);
            assert_fields(&record, (0.0, 0.0, [0; 6]));
        }
    }

    #[test]
    fn decode_modern_row() {
        let record =
            CapacityRecord::decode("1000\t500\t1\t1\t1\t1\t1\t1", FormatVersion::Modern).unwrap();
        assert!(record.is_modern());
        assert_fields(&record, (1000.0, 500.0, [1; 6]));

        let record =
            CapacityRecord::decode("1\t2\t3\t4\t5\t6\t7\t8", FormatVersion::Modern).unwrap();
        assert_fields(&record, (1.0, 2.0, [3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn decode_legacy_ignores_extra_columns() {
        let record =
            CapacityRecord::decode("1\t2\t3\t4\t5\t6\t7\t8", FormatVersion::Legacy).unwrap();
        assert!(!record.is_modern());
        assert_fields(&record, (1.0, 2.0, [3, 4, 5, 0, 0, 0]));

        let record = CapacityRecord::decode("1\t2\t3\t4\t5", FormatVersion::Legacy).unwrap();
        assert_fields(&record, (1.0, 2.0, [3, 4, 5, 0, 0, 0]));
    }

    #[test]
    fn decode_legacy_does_not_parse_ignored_columns() {
        let record =
            CapacityRecord::decode("1\t2\t3\t4\t5\tnot-a-number", FormatVersion::Legacy).unwrap();
        assert_fields(&record, (1.0, 2.0, [3, 4, 5, 0, 0, 0]));
    }

    #[test]
    fn decode_modern_rejects_short_rows() {
        let err = CapacityRecord::decode("1\t2\t3\t4\t5", FormatVersion::Modern).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));
    }

    #[test]
    fn decode_modern_rejects_long_rows() {
        let err = CapacityRecord::decode("1\t2\t3\t4\t5\t6\t7\t8\t9", FormatVersion::Modern)
            .unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));
    }

    #[test]
    fn decode_legacy_rejects_short_rows() {
        let err = CapacityRecord::decode("1\t2\t3\t4", FormatVersion::Legacy).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));
        let err = CapacityRecord::decode("", FormatVersion::Legacy).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));
    }

    #[test]
    fn decode_rejects_non_numeric_columns() {
        let err = CapacityRecord::decode("abc\t2\t3\t4\t5", FormatVersion::Legacy).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));

        let err = CapacityRecord::decode("1\t2\t3.5\t4\t5", FormatVersion::Legacy).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));

        let err =
            CapacityRecord::decode("1\t2\t3\t4\t5\t6\t7\tx", FormatVersion::Modern).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));

        let err = CapacityRecord::decode("NaN\t2\t3\t4\t5", FormatVersion::Legacy).unwrap_err();
        assert!(matches!(err, XpnError::MalformedRecord { .. }));
    }

    #[test]
    fn decode_tolerates_carriage_return() {
        let record = CapacityRecord::decode("1\t2\t3\t4\t5\r", FormatVersion::Legacy).unwrap();
        assert_eq!(record.field5(), 5);
    }

    #[test]
    fn to_row_uses_six_decimals() {
        let modern = CapacityRecord::modern(1000.0, 500.0, 1, 1, 1, 1, 1, 1);
        assert_eq!(modern.to_row("\t"), "1000.000000\t500.000000\t1\t1\t1\t1\t1\t1");

        let legacy = CapacityRecord::legacy(1000.0, 500.0, 1, 1, 1);
        assert_eq!(legacy.to_row("\t"), "1000.000000\t500.000000\t1\t1\t1");
        assert_eq!(legacy.encode(), legacy.to_row(LINKDATA_SEPARATOR));
    }

    #[test]
    fn encode_rounds_capacities() {
        let record = CapacityRecord::legacy(0.1234567, -2.5, 0, -1, 7);
        assert_eq!(record.encode(), "0.123457\t-2.500000\t0\t-1\t7");
    }

    #[test]
    fn legacy_decode_then_encode_drops_extra_columns() {
        let record =
            CapacityRecord::decode("1\t2\t3\t4\t5\t6\t7\t8", FormatVersion::Legacy).unwrap();
        assert_eq!(record.encode(), "1.000000\t2.000000\t3\t4\t5");
    }

    #[test]
    fn update_capacities_keeps_other_columns() {
        let record =
            CapacityRecord::decode("1\t2\t3\t4\t5\t6\t7\t8", FormatVersion::Modern).unwrap();
        let updated = record.update_capacities(10.0, 20.0);
        assert_fields(&updated, (10.0, 20.0, [3, 4, 5, 6, 7, 8]));
        assert_eq!(updated.tail(), record.tail());

        let record = CapacityRecord::decode("1\t2\t3\t4\t5", FormatVersion::Legacy).unwrap();
        let updated = record.update_capacities(10.0, 20.0);
        assert_fields(&updated, (10.0, 20.0, [3, 4, 5, 0, 0, 0]));
        assert!(!updated.is_modern());
    }
}
