//! Predefined macros derived from the configuration
//!
//! For every configured integer type the environment gets four limit macros:
//! `$INTMIN`, `$INTMAX`, `$UINTMIN` and `$UINTMAX` for `int`, and likewise
//! for `char`, `short`, `long` and (if configured) `long long` as
//! `$LONGLONGMIN` etc. Values are exact and carry the C literal suffix of the
//! type.

use crate::config::{Config, MAX_INTEGER_BITS};
use crate::template::{Environment, Macro, TemplateError};

/// Signed integer representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complement {
    Ones,
    Twos,
}

impl Complement {
    fn from_config(value: u8) -> Self {
        if value == 1 {
            Complement::Ones
        } else {
            Complement::Twos
        }
    }
}

/// Limits of one integer type, already formatted as C literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerLimits {
    pub signed_min: String,
    pub signed_max: String,
    pub unsigned_min: String,
    pub unsigned_max: String,
}

/// C literal suffix for `type_name`
pub fn type_suffix(type_name: &str) -> &'static str {
    match type_name {
        "long" => "L",
        "long long" => "LL",
        _ => "",
    }
}

/// Macro name stem: upper case, spaces removed (`long long` -> `LONGLONG`)
fn stem(type_name: &str) -> String {
    type_name.replace(' ', "").to_uppercase()
}

/// Compute the limits of a `bits` wide integer type
///
/// Returns `None` unless `bits` is between 1 and [`MAX_INTEGER_BITS`].
pub fn integer_limits(
    type_name: &str,
    bits: u32,
    complement: Complement,
) -> Option<IntegerLimits> {
    if bits == 0 || bits > MAX_INTEGER_BITS {
        return None;
    }

    let suffix = type_suffix(type_name);
    let half = 1i128 << (bits - 1);
    let signed_min = match complement {
        Complement::Twos => -half,
        Complement::Ones => -half + 1,
    };
    let unsigned_max = (1u128 << bits) - 1;

    Some(IntegerLimits {
        signed_min: format!("{}{}", signed_min, suffix),
        signed_max: format!("{}{}", half - 1, suffix),
        unsigned_min: "0".to_string(),
        unsigned_max: format!("{}{}", unsigned_max, suffix),
    })
}

fn define(env: &mut Environment, name: &str, body: impl Into<String>) -> Result<(), TemplateError> {
    env.define(Macro::constant(name, body)?);
    Ok(())
}

fn define_limits(
    env: &mut Environment,
    type_name: &str,
    bits: u32,
    complement: Complement,
) -> Result<(), TemplateError> {
    let stem = stem(type_name);
    let limits = integer_limits(type_name, bits, complement).ok_or_else(|| {
        TemplateError::InvalidMacro {
            reason: format!(
                "'{}' must be between 1 and {} bits wide (got {})",
                type_name, MAX_INTEGER_BITS, bits
            ),
        }
    })?;

    define(env, &format!("{}MIN", stem), limits.signed_min)?;
    define(env, &format!("{}MAX", stem), limits.signed_max)?;
    define(env, &format!("U{}MIN", stem), limits.unsigned_min)?;
    define(env, &format!("U{}MAX", stem), limits.unsigned_max)?;
    Ok(())
}

/// Build the environment every generation run starts from
///
/// The configuration must have passed [`Config::validate`].
pub fn predefined_macros(config: &Config) -> Result<Environment, TemplateError> {
    let complement = Complement::from_config(config.complement);
    let size = &config.size;

    let mut types = vec![
        ("char", size.char),
        ("short", size.short),
        ("int", size.int),
        ("long", size.long),
    ];
    if let Some(bits) = size.long_long {
        types.push(("long long", bits));
    }

    let mut env = Environment::new();
    for (type_name, bits) in types {
        define_limits(&mut env, type_name, bits, complement)?;
    }

    define(&mut env, "COMPILER", config.compiler.as_str())?;
    define(&mut env, "LANG", config.lang.as_str())?;
    define(
        &mut env,
        "OPTIONS",
        config.options.join(config.option_separator.as_str()),
    )?;

    log::debug!("{} predefined macros", env.len());
    Ok(env)
}
