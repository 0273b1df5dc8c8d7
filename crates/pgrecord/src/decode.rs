//! Decoding driver rows into [`ResultSet`]s.
//!
//! Every column yields a value: types with a natural JSON shape are decoded
//! through their `FromSql` impl, enum columns become their label, domains
//! decode as their base type, one-dimensional arrays decode element-wise, and
//! any other type is rendered as text (the Postgres output format where it is
//! simple to reproduce, `\x`-prefixed hex otherwise).

use crate::error::{DbError, DbResult};
use crate::row::ResultSet;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};

impl ResultSet {
    /// Convert a driver row, decoding each column by its Postgres type.
    ///
    /// SQL `NULL` becomes `null`; dates and times become ISO-8601 strings.
    pub fn from_pg_row(row: &Row) -> DbResult<Self> {
        let mut columns = Map::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            let raw = row
                .try_get::<_, Option<RawValue<'_>>>(idx)
                .map_err(|e| DbError::decode(column.name(), e.to_string()))?;
            let value = match raw {
                Some(RawValue(bytes)) => decode_value(column.type_(), bytes, column.name())?,
                None => Value::Null,
            };
            columns.insert(column.name().to_string(), value);
        }
        Ok(ResultSet::from(columns))
    }
}

/// The undecoded binary value of any column.
struct RawValue<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawValue<'a> {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawValue(raw))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// The label of a user-defined enum value.
struct EnumLabel(String);

impl<'a> FromSql<'a> for EnumLabel {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(EnumLabel(std::str::from_utf8(raw)?.to_owned()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

fn parse<'a, T: FromSql<'a>>(ty: &Type, raw: &'a [u8], column: &str) -> DbResult<T> {
    T::from_sql(ty, raw).map_err(|e| DbError::decode(column, e.to_string()))
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn string<T: ToString>(value: T) -> Value {
    Value::String(value.to_string())
}

fn decode_value(ty: &Type, raw: &[u8], column: &str) -> DbResult<Value> {
    let value = match *ty {
        Type::BOOL => Value::Bool(parse(ty, raw, column)?),
        Type::CHAR => Value::from(parse::<i8>(ty, raw, column)?),
        Type::INT2 => Value::from(parse::<i16>(ty, raw, column)?),
        Type::INT4 => Value::from(parse::<i32>(ty, raw, column)?),
        Type::INT8 => Value::from(parse::<i64>(ty, raw, column)?),
        Type::OID => Value::from(parse::<u32>(ty, raw, column)?),
        Type::FLOAT4 => float(f64::from(parse::<f32>(ty, raw, column)?)),
        Type::FLOAT8 => float(parse::<f64>(ty, raw, column)?),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            Value::String(parse(ty, raw, column)?)
        }
        Type::JSON | Type::JSONB => parse::<Value>(ty, raw, column)?,
        Type::UUID => string(parse::<uuid::Uuid>(ty, raw, column)?),
        Type::DATE => string(parse::<chrono::NaiveDate>(ty, raw, column)?),
        Type::TIME => string(parse::<chrono::NaiveTime>(ty, raw, column)?),
        Type::TIMESTAMP => string(
            parse::<chrono::NaiveDateTime>(ty, raw, column)?.format("%Y-%m-%dT%H:%M:%S%.f"),
        ),
        Type::TIMESTAMPTZ => {
            Value::String(parse::<chrono::DateTime<chrono::Utc>>(ty, raw, column)?.to_rfc3339())
        }
        Type::BYTEA => Value::from(parse::<Vec<u8>>(ty, raw, column)?),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => string(parse::<rust_decimal::Decimal>(ty, raw, column)?),
        Type::INTERVAL => Value::String(interval(raw, column)?),
        Type::INET | Type::CIDR => Value::String(inet(raw, column)?),
        Type::TIMETZ => Value::String(timetz(raw, column)?),
        Type::MACADDR | Type::MACADDR8 => Value::String(macaddr(raw)),
        Type::MONEY => Value::String(money(raw, column)?),
        Type::XML => Value::String(text(raw, column)?),
        _ => match ty.kind() {
            Kind::Array(member) => {
                let items = parse::<Vec<Option<RawValue<'_>>>>(ty, raw, column)?;
                Value::Array(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Some(RawValue(bytes)) => decode_value(member, bytes, column),
                            None => Ok(Value::Null),
                        })
                        .collect::<DbResult<_>>()?,
                )
            }
            Kind::Enum(_) => Value::String(parse::<EnumLabel>(ty, raw, column)?.0),
            Kind::Domain(base) => decode_value(base, raw, column)?,
            _ if <String as FromSql<'_>>::accepts(ty) => Value::String(parse(ty, raw, column)?),
            _ => Value::String(hex(raw)),
        },
    };
    Ok(value)
}

fn fixed<const N: usize>(raw: &[u8], column: &str, type_name: &str) -> DbResult<[u8; N]> {
    raw.try_into().map_err(|_| {
        DbError::decode(
            column,
            format!("expected {N} bytes for {type_name}, got {}", raw.len()),
        )
    })
}

fn text(raw: &[u8], column: &str) -> DbResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| DbError::decode(column, e.to_string()))
}

fn hex(raw: &[u8]) -> String {
    let mut out = String::with_capacity(2 + raw.len() * 2);
    out.push_str("\\x");
    for byte in raw {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// `HH:MM:SS[.ffffff]` for a non-negative number of microseconds.
fn clock(micros: u64) -> String {
    let secs = micros / 1_000_000;
    let frac = micros % 1_000_000;
    let mut out = format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    if frac != 0 {
        let digits = format!("{frac:06}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn interval(raw: &[u8], column: &str) -> DbResult<String> {
    let bytes = fixed::<16>(raw, column, "interval")?;
    let micros = i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]);
    let days = i32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let months = i32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    Ok(format_interval(months, days, micros))
}

/// Render an interval the way the server does with `IntervalStyle = postgres`.
fn format_interval(months: i32, days: i32, micros: i64) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut previous_negative = false;
    for (value, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if value == 0 {
            continue;
        }
        let sign = if previous_negative && value > 0 { "+" } else { "" };
        let plural = if value == 1 { "" } else { "s" };
        parts.push(format!("{sign}{value} {unit}{plural}"));
        previous_negative = value < 0;
    }
    if parts.is_empty() || micros != 0 {
        let sign = if micros < 0 {
            "-"
        } else if previous_negative {
            "+"
        } else {
            ""
        };
        parts.push(format!("{sign}{}", clock(micros.unsigned_abs())));
    }
    parts.join(" ")
}

fn inet(raw: &[u8], column: &str) -> DbResult<String> {
    let malformed = || DbError::decode(column, "malformed inet value");
    let (header, addr) = raw.split_at_checked(4).ok_or_else(malformed)?;
    let (family, bits, is_cidr) = (header[0], header[1], header[2] != 0);
    let (text, max_bits) = match family {
        2 => {
            let octets: [u8; 4] = addr.try_into().map_err(|_| malformed())?;
            (Ipv4Addr::from(octets).to_string(), 32)
        }
        3 => {
            let octets: [u8; 16] = addr.try_into().map_err(|_| malformed())?;
            (Ipv6Addr::from(octets).to_string(), 128)
        }
        _ => return Err(malformed()),
    };
    Ok(if is_cidr || bits != max_bits {
        format!("{text}/{bits}")
    } else {
        text
    })
}

fn timetz(raw: &[u8], column: &str) -> DbResult<String> {
    let bytes = fixed::<12>(raw, column, "timetz")?;
    let micros = i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]);
    // Stored as seconds west of UTC.
    let west = i32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let east = -i64::from(west);
    let sign = if east < 0 { '-' } else { '+' };
    let offset = east.unsigned_abs();
    let mut out = format!(
        "{}{sign}{:02}",
        clock(micros.unsigned_abs()),
        offset / 3600
    );
    if offset % 3600 != 0 {
        out.push_str(&format!(":{:02}", offset / 60 % 60));
    }
    if offset % 60 != 0 {
        out.push_str(&format!(":{:02}", offset % 60));
    }
    Ok(out)
}

fn macaddr(raw: &[u8]) -> String {
    raw.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Money is a count of minor units; two fractional digits are assumed.
fn money(raw: &[u8], column: &str) -> DbResult<String> {
    let cents = i64::from_be_bytes(fixed::<8>(raw, column, "money")?);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    Ok(format!("{sign}{}.{:02}", cents / 100, cents % 100))
}
