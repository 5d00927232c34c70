//! Degree-minute-second coordinate extraction and DMM rendering

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Degree, minute and second marks, all interchangeable
const MARK: &str = r#"(?:''|’’|[°º˚'’′‘´"“”″:\-])"#;

/// Marks that can only follow a degree value
const DEGREE_MARK: &str = r#"(?:[°º˚:\-])"#;

/// Latin letters plus their Cyrillic equivalents and homoglyphs
const NORTH_SOUTH: &str = "NSСЮC";
const EAST_WEST: &str = "EWВЗЕB";

fn angle_group(degree_sep: &str, hemispheres: &str) -> String {
    let sep = format!(" ?{}? ?", MARK);
    format!(
        r"([0-9]{{1,3}}){deg}([0-9]{{1,2}}(?:\.[0-9]+)?){sep}(?:([0-9]{{1,2}}(?:\.[0-9]+)?){sep})?([{hem}])",
        deg = degree_sep,
        sep = sep,
        hem = hemispheres,
    )
}

/// The filler between the groups may hold any text, digits included, but
/// never ends inside a number, so the second group starts at a boundary.
fn pair_pattern(degree_sep: &str) -> Regex {
    let pattern = format!(
        r"(?:^|[^0-9.]){first}(?:(?s:.{{0,59}}?)[^0-9.])??{second}",
        first = angle_group(degree_sep, NORTH_SOUTH),
        second = angle_group(degree_sep, EAST_WEST),
    );
    Regex::new(&pattern).expect("Invalid coordinate regex")
}

/// Pairs whose degree values carry an explicit mark
static MARKED_PAIR: Lazy<Regex> = Lazy::new(|| pair_pattern(&format!(" ?{} ?", DEGREE_MARK)));

/// Pairs where any mark may be missing
static BARE_PAIR: Lazy<Regex> = Lazy::new(|| pair_pattern(&format!(" ?{}? ?", MARK)));

static DECIMAL_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]),([0-9])").expect("Invalid decimal comma regex"));

static LIST_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;]").expect("Invalid punctuation regex"));

static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("Invalid whitespace regex"));

/// Which axis a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn hemisphere(self, value: f64) -> char {
        match (self, value < 0.0) {
            (Axis::Latitude, false) => 'N',
            (Axis::Latitude, true) => 'S',
            (Axis::Longitude, false) => 'E',
            (Axis::Longitude, true) => 'W',
        }
    }
}

/// A decimal-degree pair, first group as latitude, second as longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both values are inside the geographic ranges
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// `D°MM,mm' H D°MM,mm' H`
    pub fn to_dmm_string(&self) -> String {
        format!(
            "{} {}",
            format_dmm(self.lat, Axis::Latitude),
            format_dmm(self.lng, Axis::Longitude)
        )
    }
}

/// Finds the first DMS coordinate pair in free text.
///
/// The first group must carry a north/south letter and the second an
/// east/west letter, which fixes the lat/lng order. Values are not clamped.
pub struct CoordinateParser;

impl CoordinateParser {
    /// Parse the first coordinate pair, or `None` if the text has none
    pub fn parse(text: &str) -> Option<Coordinates> {
        let normalized = normalize(text);

        let caps = MARKED_PAIR
            .captures(&normalized)
            .or_else(|| BARE_PAIR.captures(&normalized))?;

        let lat = group_value(&caps, 1)?;
        let lng = group_value(&caps, 5)?;

        tracing::debug!("Parsed coordinates ({:.6}, {:.6})", lat, lng);
        Some(Coordinates::new(lat, lng))
    }
}

/// Convenience wrapper over [`CoordinateParser::parse`]
pub fn parse_coordinates(text: &str) -> Option<Coordinates> {
    CoordinateParser::parse(text)
}

/// Uppercase, unify decimal commas, turn list punctuation into spaces and
/// collapse horizontal whitespace. Line breaks are kept so that numbers on
/// different lines never merge into one angle.
fn normalize(text: &str) -> String {
    let upper = text.to_uppercase().replace('\r', "");
    let decimal = DECIMAL_COMMA.replace_all(&upper, "$1.$2");
    let spaced = LIST_PUNCTUATION.replace_all(&decimal, " ");
    HORIZONTAL_SPACE.replace_all(&spaced, " ").into_owned()
}

/// Decimal value of the angle group whose degrees are capture `first`
fn group_value(caps: &Captures, first: usize) -> Option<f64> {
    let degrees: f64 = caps.get(first)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(first + 1)?.as_str().parse().ok()?;
    let seconds: f64 = match caps.get(first + 2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0.0,
    };
    let hemisphere = caps.get(first + 3)?.as_str();

    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    let negative = matches!(hemisphere, "S" | "Ю" | "W" | "З");
    Some(if negative { -value } else { value })
}

/// Render a decimal value as `D°MM,mm' H` with a decimal comma
pub fn format_dmm(value: f64, axis: Axis) -> String {
    let hemisphere = axis.hemisphere(value);
    let abs = value.abs();
    let mut degrees = abs.trunc() as u32;
    let mut hundredths = ((abs - abs.trunc()) * 60.0 * 100.0).round() as u32;
    if hundredths >= 6000 {
        degrees += 1;
        hundredths -= 6000;
    }

    format!(
        "{}°{:02},{:02}' {}",
        degrees,
        hundredths / 100,
        hundredths % 100,
        hemisphere
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_decimal_minutes_with_comma() {
        let coords = parse_coordinates("44°37,50' N 37°45,00' E").unwrap();
        assert_close(coords.lat, 44.625, 1e-9);
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_full_dms_with_seconds() {
        let coords = parse_coordinates("44°37'30\" N, 037°45'15\" E").unwrap();
        assert_close(coords.lat, 44.0 + 37.0 / 60.0 + 30.0 / 3600.0, 1e-9);
        assert_close(coords.lng, 37.0 + 45.0 / 60.0 + 15.0 / 3600.0, 1e-9);
    }

    #[test]
    fn test_cyrillic_hemispheres_and_signs() {
        let coords = parse_coordinates("Точка 12-30,0ю 45-15,0з в районе").unwrap();
        assert_close(coords.lat, -12.5, 1e-9);
        assert_close(coords.lng, -45.25, 1e-9);

        let coords = parse_coordinates("44 37.5 с.ш. 37 45.0 в.д.").unwrap();
        assert_close(coords.lat, 44.625, 1e-9);
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_serial_number_on_previous_line_is_not_degrees() {
        let text = "ПРИП Новороссийск № 17\n44°37,50' N 37°45,00' E";
        let coords = parse_coordinates(text).unwrap();
        assert_close(coords.lat, 44.625, 1e-9);
    }

    #[test]
    fn test_serial_number_on_same_line_is_not_degrees() {
        let coords = parse_coordinates("ПРИП № 17 44°37,50' N 37°45,00' E").unwrap();
        assert_close(coords.lat, 44.625, 1e-9);
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_filler_between_groups() {
        let coords = parse_coordinates("44°37.5'N, долгота 37°45.0'E").unwrap();
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_digits_in_filler() {
        let coords = parse_coordinates("44°37,50' N (WGS-84) 37°45,00' E").unwrap();
        assert_close(coords.lat, 44.625, 1e-9);
        assert_close(coords.lng, 37.75, 1e-9);

        let coords = parse_coordinates("44°37,50' N, 2 кбт, 37°45,00' E").unwrap();
        assert_close(coords.lat, 44.625, 1e-9);
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_second_group_starts_at_number_boundary() {
        let coords = parse_coordinates("44°37,50' N 137°45,00' E").unwrap();
        assert_close(coords.lng, 137.75, 1e-9);
    }

    #[test]
    fn test_groups_on_separate_lines() {
        let coords = parse_coordinates("44°37,50' N\n37°45,00' E").unwrap();
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_non_ascii_digits_are_skipped() {
        let coords = parse_coordinates("٤٤°٣٧' N ٣٧°٤٥' E; 44°37' N 37°45' E").unwrap();
        assert_close(coords.lat, 44.0 + 37.0 / 60.0, 1e-9);
        assert_close(coords.lng, 37.75, 1e-9);
    }

    #[test]
    fn test_first_pair_wins() {
        let coords =
            parse_coordinates("44°00,00' N 37°00,00' E затем 45°00,00' N 38°00,00' E").unwrap();
        assert_close(coords.lat, 44.0, 1e-9);
        assert_close(coords.lng, 37.0, 1e-9);
    }

    #[test]
    fn test_reversed_order_is_not_found() {
        assert!(parse_coordinates("37°45,00' E 44°37,50' N").is_none());
    }

    #[test]
    fn test_no_coordinates() {
        assert!(parse_coordinates("").is_none());
        assert!(parse_coordinates("просто текст без координат 12 34").is_none());
        assert!(parse_coordinates("44°37' N only one group").is_none());
    }

    #[test]
    fn test_out_of_range_passes_through() {
        let coords = parse_coordinates("120°00' N 200°00' E").unwrap();
        assert_close(coords.lat, 120.0, 1e-9);
        assert_close(coords.lng, 200.0, 1e-9);
        assert!(!coords.is_in_range());
    }

    #[test]
    fn test_format_dmm() {
        assert_eq!(format_dmm(44.625, Axis::Latitude), "44°37,50' N");
        assert_eq!(format_dmm(37.75, Axis::Longitude), "37°45,00' E");
        assert_eq!(format_dmm(-12.5, Axis::Latitude), "12°30,00' S");
        assert_eq!(format_dmm(-0.25, Axis::Longitude), "0°15,00' W");
        // Minutes that round up to 60 carry into the degrees
        assert_eq!(format_dmm(10.99999, Axis::Latitude), "11°00,00' N");
    }

    #[test]
    fn test_to_dmm_string() {
        let coords = Coordinates::new(44.625, 37.75);
        assert_eq!(coords.to_dmm_string(), "44°37,50' N 37°45,00' E");
    }

    proptest! {
        #[test]
        fn dms_parses_to_formula(
            lat_deg in 0u32..180, lat_min in 0u32..60, lat_sec_milli in 0u32..60_000,
            lng_deg in 0u32..180, lng_min in 0u32..60, lng_sec_milli in 0u32..60_000,
            south in any::<bool>(), west in any::<bool>(),
        ) {
            let lat_sec = lat_sec_milli as f64 / 1000.0;
            let lng_sec = lng_sec_milli as f64 / 1000.0;
            let text = format!(
                "{}°{}'{:.3}\" {} {}°{}'{:.3}\" {}",
                lat_deg, lat_min, lat_sec, if south { 'S' } else { 'N' },
                lng_deg, lng_min, lng_sec, if west { 'W' } else { 'E' },
            );

            let coords = parse_coordinates(&text).unwrap();
            let mut lat = lat_deg as f64 + lat_min as f64 / 60.0 + lat_sec / 3600.0;
            let mut lng = lng_deg as f64 + lng_min as f64 / 60.0 + lng_sec / 3600.0;
            if south { lat = -lat; }
            if west { lng = -lng; }

            prop_assert!((coords.lat - lat).abs() < 1e-6);
            prop_assert!((coords.lng - lng).abs() < 1e-6);
        }

        #[test]
        fn dmm_round_trip(lat in -90.0f64..90.0, lng in -180.0f64..180.0) {
            let rendered = Coordinates::new(lat, lng).to_dmm_string();
            let parsed = parse_coordinates(&rendered).unwrap();
            // Two decimal places of minutes
            let tolerance = 0.005 / 60.0 + 1e-9;
            prop_assert!((parsed.lat - lat).abs() <= tolerance);
            prop_assert!((parsed.lng - lng).abs() <= tolerance);
        }
    }
}
