//! Unit parsing and conversion for platform quantity strings.
//!
//! Units are written the way the health store emits them: simple symbols
//! (`kg`, `degF`, `%`), quotients and products (`count/min`, `mL/(kg*min)`),
//! powers (`kg/m^2`) and molar masses (`mmol<180.1558800000541>/L`).
//! Every unit reduces to a dimension vector plus a linear map onto the base
//! unit of that dimension.

const DIMENSIONS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dimension {
    Count,
    Length,
    Mass,
    Energy,
    Volume,
    Time,
    Pressure,
    Temperature,
    Fraction,
    Conductance,
    SoundLevel,
    InternationalUnit,
}

/// A parsed unit. `base = value * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    dims: [i8; DIMENSIONS],
    scale: f64,
    offset: f64,
}

impl Unit {
    fn atom(dimension: Dimension, scale: f64) -> Self {
        Self::affine(dimension, scale, 0.0)
    }

    fn affine(dimension: Dimension, scale: f64, offset: f64) -> Self {
        let mut dims = [0; DIMENSIONS];
        dims[dimension as usize] = 1;
        Self {
            dims,
            scale,
            offset,
        }
    }

    fn dimensionless() -> Self {
        Self {
            dims: [0; DIMENSIONS],
            scale: 1.0,
            offset: 0.0,
        }
    }

    /// Parse a unit string. Returns `None` for unknown symbols or malformed
    /// expressions.
    pub fn parse(text: &str) -> Option<Unit> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match text.split_once('/') {
            Some((numerator, denominator)) => {
                let num = parse_product(strip_parens(numerator))?;
                let den = parse_product(strip_parens(denominator))?;
                num.divide(&den)
            }
            None => parse_product(text),
        }
    }

    /// Whether `other` measures the same physical quantity.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Convert `value` expressed in `self` into `target`.
    pub fn convert(&self, value: f64, target: &Unit) -> Option<f64> {
        if !self.is_compatible(target) {
            return None;
        }
        let base = value * self.scale + self.offset;
        Some((base - target.offset) / target.scale)
    }

    fn multiply(&self, other: &Unit) -> Option<Unit> {
        if self.offset != 0.0 || other.offset != 0.0 {
            return None;
        }
        let mut dims = self.dims;
        for (d, o) in dims.iter_mut().zip(other.dims.iter()) {
            *d = d.checked_add(*o)?;
        }
        Some(Unit {
            dims,
            scale: self.scale * other.scale,
            offset: 0.0,
        })
    }

    fn divide(&self, other: &Unit) -> Option<Unit> {
        self.multiply(&other.powi(-1)?)
    }

    fn powi(&self, exponent: i8) -> Option<Unit> {
        if exponent == 1 {
            return Some(*self);
        }
        if self.offset != 0.0 {
            return None;
        }
        let mut dims = self.dims;
        for d in dims.iter_mut() {
            *d = d.checked_mul(exponent)?;
        }
        Some(Unit {
            dims,
            scale: self.scale.powi(i32::from(exponent)),
            offset: 0.0,
        })
    }
}

/// Convert between two unit strings.
pub fn convert(value: f64, from: &str, to: &str) -> Option<f64> {
    let from = Unit::parse(from)?;
    let to = Unit::parse(to)?;
    from.convert(value, &to)
}

fn strip_parens(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(s)
        .trim()
}

fn parse_product(text: &str) -> Option<Unit> {
    let mut terms = text.split(['*', '·', '⋅']);
    let first = parse_term(terms.next()?)?;
    terms.try_fold(first, |acc, term| acc.multiply(&parse_term(term)?))
}

fn parse_term(term: &str) -> Option<Unit> {
    let term = term.trim();
    match term.split_once('^') {
        Some((base, exponent)) => {
            let exponent: i8 = exponent.trim().parse().ok()?;
            parse_symbol(base.trim())?.powi(exponent)
        }
        None => parse_symbol(term),
    }
}

fn parse_symbol(symbol: &str) -> Option<Unit> {
    use Dimension::*;

    if let Some(unit) = parse_molar(symbol) {
        return Some(unit);
    }

    let unit = match symbol {
        "count" => Unit::atom(Count, 1.0),

        "m" => Unit::atom(Length, 1.0),
        "km" => Unit::atom(Length, 1_000.0),
        "cm" => Unit::atom(Length, 0.01),
        "mm" => Unit::atom(Length, 0.001),
        "ft" => Unit::atom(Length, 0.3048),
        "in" => Unit::atom(Length, 0.0254),
        "yd" => Unit::atom(Length, 0.9144),
        "mi" => Unit::atom(Length, 1_609.344),

        "g" => Unit::atom(Mass, 1.0),
        "kg" => Unit::atom(Mass, 1_000.0),
        "mg" => Unit::atom(Mass, 1e-3),
        "mcg" | "µg" => Unit::atom(Mass, 1e-6),
        "lb" => Unit::atom(Mass, 453.592_37),
        "oz" => Unit::atom(Mass, 28.349_523_125),
        "st" => Unit::atom(Mass, 6_350.293_18),

        "kcal" | "Cal" => Unit::atom(Energy, 1.0),
        "cal" => Unit::atom(Energy, 1e-3),
        "kJ" => Unit::atom(Energy, 1.0 / 4.184),
        "J" => Unit::atom(Energy, 1.0 / 4_184.0),

        "L" => Unit::atom(Volume, 1.0),
        "dL" => Unit::atom(Volume, 0.1),
        "cL" => Unit::atom(Volume, 0.01),
        "mL" => Unit::atom(Volume, 1e-3),
        "fl_oz_us" => Unit::atom(Volume, 0.029_573_529_562_5),
        "cup_us" => Unit::atom(Volume, 0.236_588_236_5),

        "s" => Unit::atom(Time, 1.0),
        "ms" => Unit::atom(Time, 1e-3),
        "min" => Unit::atom(Time, 60.0),
        "hr" => Unit::atom(Time, 3_600.0),
        "d" => Unit::atom(Time, 86_400.0),

        "mmHg" => Unit::atom(Pressure, 1.0),
        "cmAq" => Unit::atom(Pressure, 0.735_559_24),
        "inHg" => Unit::atom(Pressure, 25.4),
        "kPa" => Unit::atom(Pressure, 7.500_616_827),
        "Pa" => Unit::atom(Pressure, 0.007_500_616_827),

        "degC" => Unit::affine(Temperature, 1.0, 0.0),
        "degF" => Unit::affine(Temperature, 5.0 / 9.0, -160.0 / 9.0),
        "K" => Unit::affine(Temperature, 1.0, -273.15),

        "%" => Unit::atom(Fraction, 1.0),

        "S" => Unit::atom(Conductance, 1.0),
        "mS" => Unit::atom(Conductance, 1e-3),
        "mcS" | "µS" => Unit::atom(Conductance, 1e-6),

        "dBASPL" => Unit::atom(SoundLevel, 1.0),

        "IU" => Unit::atom(InternationalUnit, 1.0),

        "1" => Unit::dimensionless(),
        _ => return None,
    };
    Some(unit)
}

/// `mol<M>` and `mmol<M>` where `M` is the molar mass in g/mol. These
/// reduce to mass so glucose readings convert between mmol/L and mg/dL.
fn parse_molar(symbol: &str) -> Option<Unit> {
    let (prefix, rest) = symbol.split_once('<')?;
    let molar_mass: f64 = rest.strip_suffix('>')?.parse().ok()?;
    if !molar_mass.is_finite() || molar_mass <= 0.0 {
        return None;
    }
    let factor = match prefix {
        "mol" => 1.0,
        "mmol" => 1e-3,
        _ => return None,
    };
    Some(Unit::atom(Dimension::Mass, molar_mass * factor))
}
