//! Number format rendering
//!
//! [`format_value`] renders a numeric cell value the way a spreadsheet
//! displays it under a number format code such as `#,##0.00`,
//! `yyyy-mm-dd` or `0;[Red]-0`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::config::Calendar;

/// Color tag of a format section, e.g. `[Red]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatColor {
    /// `[Black]`
    Black,
    /// `[White]`
    White,
    /// `[Red]`
    Red,
    /// `[Green]`
    Green,
    /// `[Blue]`
    Blue,
    /// `[Yellow]`
    Yellow,
    /// `[Magenta]`
    Magenta,
    /// `[Cyan]`
    Cyan,
}

impl FormatColor {
    fn from_name(name: &str) -> Option<FormatColor> {
        const NAMES: [(&str, FormatColor); 8] = [
            ("Black", FormatColor::Black),
            ("White", FormatColor::White),
            ("Red", FormatColor::Red),
            ("Green", FormatColor::Green),
            ("Blue", FormatColor::Blue),
            ("Yellow", FormatColor::Yellow),
            ("Magenta", FormatColor::Magenta),
            ("Cyan", FormatColor::Cyan),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, c)| c)
    }
}

/// Operator of a section condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
}

/// Section condition, e.g. `[>=100]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    /// Operator
    pub op: Comparison,
    /// Right hand side
    pub value: f64,
}

impl Condition {
    fn parse(s: &str) -> Option<Condition> {
        let (op, rest) = [
            (">=", Comparison::GreaterOrEqual),
            ("<=", Comparison::LessOrEqual),
            ("<>", Comparison::NotEqual),
            (">", Comparison::Greater),
            ("<", Comparison::Less),
            ("=", Comparison::Equal),
        ]
        .iter()
        .find_map(|&(p, op)| s.strip_prefix(p).map(|rest| (op, rest)))?;

        // [+-]digits[.digits]
        let digits = rest.strip_prefix(['+', '-']).unwrap_or(rest);
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        let valid = match digits.split_once('.') {
            Some((int, frac)) => all_digits(int) && all_digits(frac),
            None => all_digits(digits),
        };
        if !valid {
            return None;
        }
        let value = fast_float2::parse::<f64, _>(rest.as_bytes()).ok()?;
        Some(Condition { op, value })
    }

    /// Whether `value` satisfies the condition
    pub fn holds(&self, value: f64) -> bool {
        match self.op {
            Comparison::Less => value < self.value,
            Comparison::LessOrEqual => value <= self.value,
            Comparison::Greater => value > self.value,
            Comparison::GreaterOrEqual => value >= self.value,
            Comparison::Equal => value == self.value,
            Comparison::NotEqual => value != self.value,
        }
    }
}

/// One `;` separated part of a format code
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    text: String,
    color: Option<FormatColor>,
    condition: Option<Condition>,
}

impl Section {
    fn parse(raw: &str) -> Section {
        let cleaned = clean_section(raw);
        let mut text = String::with_capacity(cleaned.len());
        let mut color = None;
        let mut condition = None;
        let mut rest = cleaned.as_str();
        while let Some(open) = rest.find('[') {
            text.push_str(&rest[..open]);
            let Some(close) = rest[open..].find(']') else {
                rest = &rest[open..];
                break;
            };
            let inner = &rest[open + 1..open + close];
            if let Some(c) = FormatColor::from_name(inner) {
                color.get_or_insert(c);
            } else if let Some(c) = Condition::parse(inner) {
                condition.get_or_insert(c);
            } else {
                text.push_str(&rest[open..=open + close]);
            }
            rest = &rest[open + close + 1..];
        }
        text.push_str(rest);
        Section {
            text,
            color,
            condition,
        }
    }

    /// Format text without its color and condition tags
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Color tag
    pub fn color(&self) -> Option<FormatColor> {
        self.color
    }

    /// Condition tag
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    fn holds_or(&self, value: f64, op: Comparison) -> bool {
        self.condition
            .unwrap_or(Condition { op, value: 0.0 })
            .holds(value)
    }
}

/// Drops quotes, fill markers, `[$-xxx]` locale tags and escapes
fn clean_section(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("[$-") {
        out.push_str(&rest[..start]);
        match rest[start..].find(']') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.retain(|c| !matches!(c, '"' | '*' | '\\'));
    out
}

/// Splits on `;` outside of quotes and escapes
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::with_capacity(4);
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in code.char_indices() {
        match (c, escaped, quoted) {
            (_, true, _) => escaped = false,
            ('\\', false, false) => escaped = true,
            ('"', ..) => quoted = !quoted,
            (';', false, false) => {
                sections.push(&code[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    sections.push(&code[start..]);
    sections
}

/// A parsed number format code
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCode {
    sections: Vec<Section>,
}

impl FormatCode {
    /// Parses up to four sections
    pub fn parse(code: &str) -> FormatCode {
        FormatCode {
            sections: split_sections(code)
                .into_iter()
                .take(4)
                .map(Section::parse)
                .collect(),
        }
    }

    /// Sections in code order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Index of the section rendering `value`
    ///
    /// With two sections the first one applies when its condition holds,
    /// `>= 0` by default. With three or four, the first applies when its
    /// condition holds (`> 0`), else the second when its own holds (`< 0`),
    /// else the third.
    pub fn select(&self, value: f64) -> usize {
        let s = &self.sections;
        match s.len() {
            2 if !s[0].holds_or(value, Comparison::GreaterOrEqual) => 1,
            3 | 4 if !s[0].holds_or(value, Comparison::Greater) => {
                if s[1].holds_or(value, Comparison::Less) {
                    1
                } else {
                    2
                }
            }
            _ => 0,
        }
    }
}

/// Renders `value` with the number format `code`
///
/// # Examples
///
/// ```
/// use sheetstream::{format_value, Calendar};
///
/// assert_eq!(format_value(3.1, "0.00", Calendar::Windows1900), "3.10");
/// assert_eq!(format_value(-5.0, "0;[Red]-0", Calendar::Windows1900), "-5");
/// assert_eq!(format_value(1000.0, "yyyy-mm-dd", Calendar::Windows1900), "1902-09-26");
/// ```
pub fn format_value(value: f64, code: &str, calendar: Calendar) -> String {
    if code == "General" || code == "@" {
        return general(value);
    }
    let format = FormatCode::parse(code);
    let index = format.select(value);
    let text = match format.sections.get(index) {
        Some(s) => strip_padding(&s.text),
        None => return general(value),
    };
    // the negative section carries its own sign, if any
    let drop_sign = index > 0;

    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("General") || trimmed == "@" {
        general(if drop_sign { value.abs() } else { value })
    } else if is_date_section(&text) {
        render_date(value, &text, calendar)
    } else if text.contains("?/?") {
        render_fraction(value, &text, drop_sign)
    } else if text.contains(['0', '#']) {
        render_number(value, &text, drop_sign)
    } else {
        text.replace('?', "")
    }
}

/// Whether the first section of `code` renders a date or a time
pub fn is_date_format(code: &str) -> bool {
    FormatCode::parse(code)
        .sections
        .first()
        .is_some_and(|s| is_date_section(&strip_padding(&s.text)))
}

fn general(value: f64) -> String {
    format!("{value}")
}

/// Removes `_x` padding pairs
fn strip_padding(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '_' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Starts, after optional `[$x-yyy]` tags, with a date or time letter
fn is_date_section(text: &str) -> bool {
    let mut rest = text;
    while let Some(tag) = rest.strip_prefix("[$") {
        let mut chars = tag.chars();
        let (Some(c), Some('-')) = (chars.next(), chars.next()) else {
            break;
        };
        if !c.is_ascii_alphanumeric() {
            break;
        }
        let tail = chars.as_str();
        let hex = tail
            .find(|c: char| !matches!(c, '0'..='9' | 'A'..='F'))
            .unwrap_or(tail.len());
        match tail[hex..].strip_prefix(']') {
            Some(r) => rest = r,
            None => break,
        }
    }
    rest.chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's' | 'd' | 'y'))
}

/// Converts a serial number to a date time
///
/// Negative serials have no date. The fractional part is truncated to the
/// second.
pub fn serial_to_datetime(value: f64, calendar: Calendar) -> Option<NaiveDateTime> {
    if !(value >= 0.0) {
        return None;
    }
    let (y, m, d) = match calendar {
        Calendar::Windows1900 if value < 1.0 => (1970, 1, 1),
        Calendar::Windows1900 if value < 60.0 => (1899, 12, 31),
        Calendar::Windows1900 => (1899, 12, 30),
        Calendar::Mac1904 => (1904, 1, 1),
    };
    let days = value.trunc();
    let seconds = ((value - days) * 86_400.0).trunc() as i64;
    NaiveDate::from_ymd_opt(y, m, d)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days as i64)?)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Date tokens, longest first at any position
const DATE_TOKENS: [&str; 19] = [
    "am/pm", "yyyy", "yy", "y", "mmmmm", "mmmm", "mmm", ":mm", "mm", "m", "dddd", "ddd", "dd",
    "d", "hh", "h", "ss", "s", ".s",
];

fn render_date(value: f64, text: &str, calendar: Calendar) -> String {
    let Some(dt) = serial_to_datetime(value, calendar) else {
        return text.to_string();
    };
    let format = text.to_lowercase();
    // only `hh` switches to the 12-hour clock, `h` is always 24-hour
    let twelve_hours = format.contains("am/pm");
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    let month = dt.month0() as usize;
    let weekday = dt.weekday().num_days_from_monday() as usize;

    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format.as_str();
    while let Some(c) = rest.chars().next() {
        let Some(token) = DATE_TOKENS.iter().find(|t| rest.starts_with(**t)) else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        };
        rest = &rest[token.len()..];
        let piece = match *token {
            "am/pm" if dt.hour() < 12 => "AM".to_string(),
            "am/pm" => "PM".to_string(),
            "yyyy" => format!("{:04}", dt.year()),
            "yy" | "y" => format!("{:02}", dt.year().rem_euclid(100)),
            "mmmmm" | "mmm" => MONTHS[month][..3].to_string(),
            "mmmm" => MONTHS[month].to_string(),
            ":mm" => format!(":{:02}", dt.minute()),
            "mm" => format!("{:02}", dt.month()),
            "m" => dt.month().to_string(),
            "dddd" => WEEKDAYS[weekday].to_string(),
            "ddd" => WEEKDAYS[weekday][..3].to_string(),
            "dd" => format!("{:02}", dt.day()),
            "d" => dt.day().to_string(),
            "hh" if twelve_hours => format!("{hour12:02}"),
            "hh" => format!("{:02}", dt.hour()),
            "h" => dt.hour().to_string(),
            "ss" | "s" => format!("{:02}", dt.second()),
            _ => String::new(),
        };
        out.push_str(&piece);
    }
    out
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Integer part and significant decimal digits of `value`, rounded to
/// 14 significant digits
fn split_decimal(value: f64) -> Option<(u64, String)> {
    let int_digits = format!("{}", value.trunc()).len();
    let precision = 14usize.saturating_sub(int_digits);
    let s = format!("{value:.precision$}");
    let (int, dec) = s.split_once('.').unwrap_or((&s, ""));
    let int = int.parse().ok()?;
    Some((int, dec.trim_end_matches('0').to_string()))
}

fn render_fraction(value: f64, text: &str, drop_sign: bool) -> String {
    let sign = if value < 0.0 && !drop_sign { "-" } else { "" };
    let Some((int, dec)) = split_decimal(value.abs()) else {
        return general(value);
    };
    let num = match dec.parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => return format!("{sign}{int}"),
    };
    let den = 10u64.pow(dec.len() as u32);
    let g = gcd(num, den);
    let (num, den) = (num / g, den / g);

    if text.contains('0') {
        format!("{sign}{int} {num}/{den}")
    } else if text.contains('#') {
        if int == 0 {
            format!("{sign}{num}/{den}")
        } else {
            format!("{sign}{int} {num}/{den}")
        }
    } else if text.starts_with("? ?") {
        if int == 0 {
            format!("{sign} {num}/{den}")
        } else {
            format!("{sign}{int} {num}/{den}")
        }
    } else {
        let improper = u128::from(num) + u128::from(int) * u128::from(den);
        format!("{sign}{improper}/{den}")
    }
}

fn round_half_away(value: f64, scale: usize) -> f64 {
    let p = 10f64.powi(scale.min(15) as i32);
    (value * p).round() / p
}

/// Replaces `[$CODE-xxxx]` currency tags with `CODE`
fn currency(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[$") {
        out.push_str(&rest[..start]);
        let tag = &rest[start + 2..];
        match tag.find(']') {
            Some(end) => {
                out.push_str(tag[..end].split('-').next().unwrap_or_default());
                rest = &tag[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Digit placeholders of the number run
struct Placeholders {
    min_int: usize,
    int_places: usize,
    optional_int: bool,
    frac_required: usize,
    frac_optional: usize,
    thousands: bool,
}

impl Placeholders {
    fn new(run: &str) -> Placeholders {
        let (int, frac) = run.split_once('.').unwrap_or((run, ""));
        let count = |s: &str, f: fn(char) -> bool| s.chars().filter(|&c| f(c)).count();
        Placeholders {
            min_int: count(int, |c| c == '0'),
            int_places: count(int, |c| matches!(c, '0' | '#' | '?')),
            optional_int: int.contains(['#', '?']),
            frac_required: count(frac, |c| c == '0'),
            frac_optional: count(frac, |c| matches!(c, '#' | '?')),
            thousands: int.trim_end_matches(',').contains(','),
        }
    }

    fn render(&self, value: f64) -> String {
        let scale = self.frac_required + self.frac_optional;
        let s = format!("{:.scale$}", round_half_away(value, scale));
        let (int, frac) = s.split_once('.').unwrap_or((&s, ""));

        let mut frac = frac.to_string();
        while frac.len() > self.frac_required && frac.ends_with('0') {
            frac.pop();
        }
        let int = if int == "0" && self.min_int == 0 {
            String::new()
        } else if int.len() < self.min_int {
            format!("{}{int}", "0".repeat(self.min_int - int.len()))
        } else {
            int.to_string()
        };
        let int = if self.thousands {
            group_thousands(&int)
        } else {
            int
        };
        if frac.is_empty() {
            int
        } else {
            format!("{int}.{frac}")
        }
    }
}

fn render_number(value: f64, text: &str, drop_sign: bool) -> String {
    let is_placeholder = |c: u8| matches!(c, b'0' | b'#' | b'?');
    let bytes = text.as_bytes();
    // first placeholder outside of [...] tags
    let mut start = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => i += bytes[i..].iter().position(|&b| b == b']').unwrap_or(bytes.len()),
            b if is_placeholder(b) => {
                start = Some(i);
                break;
            }
            b'.' if bytes.get(i + 1).copied().is_some_and(is_placeholder) => {
                start = Some(i);
                break;
            }
            _ => (),
        }
        i += 1;
    }
    let Some(start) = start else {
        return text.replace('?', "");
    };
    let mut end = start;
    while end < bytes.len() && (is_placeholder(bytes[end]) || matches!(bytes[end], b',' | b'.')) {
        end += 1;
    }
    let run = &text[start..end];

    // scientific exponent: E+00 / E-0
    let mut exponent = None;
    if let (Some(e @ (b'E' | b'e')), Some(sign @ (b'+' | b'-'))) =
        (bytes.get(end).copied(), bytes.get(end + 1).copied())
    {
        let digits = bytes[end + 2..].iter().take_while(|&&b| b == b'0').count();
        if digits > 0 {
            exponent = Some((e as char, sign == b'+', digits));
            end += 2 + digits;
        }
    }

    let prefix = currency(&text[..start]);
    let suffix = currency(&text[end..]);
    let placeholders = Placeholders::new(run);

    let mut value = value;
    if text.contains('%') {
        value *= 100.0;
    }
    let negative = value < 0.0 && !drop_sign;
    let value = value.abs();

    let number = match exponent {
        Some((e, always_sign, digits)) => {
            let step = if placeholders.optional_int {
                placeholders.int_places.max(1) as i32
            } else {
                1
            };
            let scale = placeholders.frac_required + placeholders.frac_optional;
            let mut exp = if value == 0.0 {
                0
            } else {
                value.log10().floor() as i32
            };
            exp -= exp.rem_euclid(step);
            let mut mantissa = round_half_away(value / 10f64.powi(exp), scale);
            if mantissa >= 10f64.powi(step) {
                exp += step;
                mantissa = round_half_away(value / 10f64.powi(exp), scale);
            }
            let sign = match (exp < 0, always_sign) {
                (true, _) => "-",
                (false, true) => "+",
                (false, false) => "",
            };
            format!(
                "{}{e}{sign}{:0digits$}",
                placeholders.render(mantissa),
                exp.unsigned_abs()
            )
        }
        None => placeholders.render(value),
    };

    // a value rounding to zero keeps its sign: -0.001 is "-0.00"
    let sign = if negative { "-" } else { "" };
    format!("{sign}{prefix}{number}{suffix}")
}

/// Format code of a built-in number format id
///
/// Id 0 is `General`, ids reserved for localized formats resolve to their
/// usual code.
pub fn builtin_format_code(id: u16) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        // CHT & CHS
        27 | 36 | 50 | 57 => "[$-404]e/m/d",
        30 => "m/d/yy",
        // JPN
        28 | 29 | 51 | 54 | 58 => "[$-411]ggge\"年\"m\"月\"d\"日\"",
        31 => "yyyy\"年\"m\"月\"d\"日\"",
        32 => "h\"時\"mm\"分\"",
        33 => "h\"時\"mm\"分\"ss\"秒\"",
        34 | 52 | 55 => "yyyy\"年\"m\"月\"",
        35 | 53 | 56 => "m\"月\"d\"日\"",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        44 => r#"_("$"* #,##0.00_);_("$"* \(#,##0.00\);_("$"* "-"??_);_(@_)"#,
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        // THA
        59 => "t0",
        60 => "t0.00",
        61 => "t#,##0",
        62 => "t#,##0.00",
        67 => "t0%",
        68 => "t0.00%",
        69 => "t# ?/?",
        70 => "t# ??/??",
        _ => return None,
    };
    Some(code)
}
