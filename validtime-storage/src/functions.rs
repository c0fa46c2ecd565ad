//! Range SQL functions registered on every SQLite connection.
//!
//! Each subtype gets its own family, prefixed `period_` for instants and
//! `daterange_` for dates, operating on canonical range text. NULL in any
//! argument yields NULL. The constraints created by [`crate::schema`] and
//! the statements issued by the merge engine are written against them.

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;

use validtime_core::interval::EMPTY;
use validtime_core::{DateKind, InstantKind, Interval, TemporalKind, ValidtimeError};

type Predicate<K> = fn(&Interval<K>, &Interval<K>) -> bool;
type Combinator<K> = fn(&Interval<K>, &Interval<K>) -> Interval<K>;

/// Register the `period_*` and `daterange_*` families.
pub fn register_range_functions(conn: &Connection) -> rusqlite::Result<()> {
    register_kind::<InstantKind>(conn)?;
    register_kind::<DateKind>(conn)?;
    tracing::debug!("range SQL functions registered");
    Ok(())
}

fn flags() -> FunctionFlags {
    FunctionFlags::SQLITE_UTF8
        | FunctionFlags::SQLITE_DETERMINISTIC
        | FunctionFlags::SQLITE_INNOCUOUS
}

fn user_err<E>(e: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    rusqlite::Error::UserFunctionError(e.into())
}

fn text_arg(ctx: &Context<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    ctx.get::<Option<String>>(idx)
}

fn interval_arg<K: TemporalKind>(
    ctx: &Context<'_>,
    idx: usize,
) -> rusqlite::Result<Option<Interval<K>>> {
    match text_arg(ctx, idx)? {
        Some(text) => Interval::<K>::parse(&text).map(Some).map_err(user_err),
        None => Ok(None),
    }
}

fn looks_like_interval(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with('[') || t.starts_with('(') || t.eq_ignore_ascii_case(EMPTY)
}

fn register_kind<K: TemporalKind>(conn: &Connection) -> rusqlite::Result<()> {
    let prefix = K::SUBTYPE.function_prefix();
    let name = |op: &str| format!("{prefix}_{op}");

    // Bound accessors. `lower`/`upper` of empty are NULL; `prior`/`later`
    // of empty or past the representable range are errors.
    conn.create_scalar_function(name("lower").as_str(), 1, flags(), |ctx| {
        Ok(interval_arg::<K>(ctx, 0)?
            .and_then(|p| p.start())
            .map(|v| K::format_value(&v)))
    })?;
    conn.create_scalar_function(name("upper").as_str(), 1, flags(), |ctx| {
        Ok(interval_arg::<K>(ctx, 0)?
            .and_then(|p| p.end())
            .map(|v| K::format_value(&v)))
    })?;
    conn.create_scalar_function(name("prior").as_str(), 1, flags(), |ctx| {
        match interval_arg::<K>(ctx, 0)? {
            Some(p) => p.prior().map(|v| Some(K::format_value(&v))).map_err(user_err),
            None => Ok(None),
        }
    })?;
    conn.create_scalar_function(name("later").as_str(), 1, flags(), |ctx| {
        match interval_arg::<K>(ctx, 0)? {
            Some(p) => p.later().map(|v| Some(K::format_value(&v))).map_err(user_err),
            None => Ok(None),
        }
    })?;
    conn.create_scalar_function(name("isempty").as_str(), 1, flags(), |ctx| {
        Ok(interval_arg::<K>(ctx, 0)?.map(|p| p.is_empty()))
    })?;

    // Constructor: `range(lower, upper)` is `[lower, upper)`; NULL upper
    // means current.
    conn.create_scalar_function(name("range").as_str(), 2, flags(), |ctx| {
        let Some(lower) = text_arg(ctx, 0)? else {
            return Ok(None);
        };
        let lower = K::parse_value(&lower).map_err(user_err)?;
        let upper = match text_arg(ctx, 1)? {
            Some(text) => K::parse_value(&text).map_err(user_err)?,
            None => K::current(),
        };
        if lower > upper {
            return Err(user_err(ValidtimeError::InvalidArgument(format!(
                "range lower bound {} must be less than or equal to upper bound {}",
                K::format_value(&lower),
                K::format_value(&upper)
            ))));
        }
        Interval::<K>::new(lower, upper)
            .map(|p| Some(p.to_string()))
            .map_err(user_err)
    })?;

    conn.create_scalar_function(name("canonical").as_str(), 1, flags(), |ctx| {
        Ok(interval_arg::<K>(ctx, 0)?.map(|p| p.to_string()))
    })?;

    conn.create_scalar_function(name("cmp").as_str(), 2, flags(), |ctx| {
        let (Some(a), Some(b)) = (interval_arg::<K>(ctx, 0)?, interval_arg::<K>(ctx, 1)?) else {
            return Ok(None);
        };
        Ok(Some(a.cmp(&b) as i64))
    })?;

    // `contains` accepts either an interval or a single point on the right.
    conn.create_scalar_function(name("contains").as_str(), 2, flags(), |ctx| {
        let Some(a) = interval_arg::<K>(ctx, 0)? else {
            return Ok(None);
        };
        match text_arg(ctx, 1)? {
            None => Ok(None),
            Some(text) if looks_like_interval(&text) => {
                let b = Interval::<K>::parse(&text).map_err(user_err)?;
                Ok(Some(a.contains(&b)))
            }
            Some(text) => {
                let point = K::parse_value(&text).map_err(user_err)?;
                Ok(Some(a.contains_point(point)))
            }
        }
    })?;

    let predicates: [(&str, Predicate<K>); 8] = [
        ("eq", |a, b| a == b),
        ("overlaps", Interval::<K>::overlaps),
        ("contained_by", Interval::<K>::contained_by),
        ("before", Interval::<K>::before),
        ("after", Interval::<K>::after),
        ("overleft", Interval::<K>::overleft),
        ("overright", Interval::<K>::overright),
        ("adjacent", Interval::<K>::adjacent),
    ];
    for (op, predicate) in predicates {
        conn.create_scalar_function(name(op).as_str(), 2, flags(), move |ctx| {
            let (Some(a), Some(b)) = (interval_arg::<K>(ctx, 0)?, interval_arg::<K>(ctx, 1)?)
            else {
                return Ok(None);
            };
            Ok(Some(predicate(&a, &b)))
        })?;
    }

    let combinators: [(&str, Combinator<K>); 2] = [
        ("intersection", Interval::<K>::intersection),
        ("union", Interval::<K>::union),
    ];
    for (op, combine) in combinators {
        conn.create_scalar_function(name(op).as_str(), 2, flags(), move |ctx| {
            let (Some(a), Some(b)) = (interval_arg::<K>(ctx, 0)?, interval_arg::<K>(ctx, 1)?)
            else {
                return Ok(None);
            };
            Ok(Some(combine(&a, &b).to_string()))
        })?;
    }

    Ok(())
}
