//! 008 synthesis from aggregate evidence across child records.
//!
//! Layout (40 positions):
//!
//! ```text
//! 00-05  date entered (yymmdd)
//! 06     date type          n s m c d
//! 07-10  Date1
//! 11-14  Date2
//! 15-17  place of publication
//! 18-34  books or continuing-resources block
//! 35-37  language
//! 38     modified record    (blank)
//! 39     cataloging source  d
//! ```
//!
//! Every code defaults to its unspecified value when no child gives evidence.

use catalog_db_core::{descriptive, CatalogRecord};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

pub const FIXED_FIELD_LEN: usize = 40;
pub const UNKNOWN_PLACE: &str = "xx ";

/// Place substrings, matched against lowercased place and publisher text.
const PLACE_TABLE: &[(&str, &str)] = &[
    ("washington", "dcu"),
    ("g.p.o", "dcu"),
    ("government printing office", "dcu"),
    ("new york", "nyu"),
    ("chicago", "ilu"),
    ("boston", "mau"),
    ("cambridge, mass", "mau"),
    ("philadelphia", "pau"),
    ("pittsburgh", "pau"),
    ("baltimore", "mdu"),
    ("bethesda", "mdu"),
    ("denver", "cou"),
    ("atlanta", "gau"),
    ("los angeles", "cau"),
    ("san francisco", "cau"),
    ("berkeley", "cau"),
    ("seattle", "wau"),
    ("austin", "txu"),
    ("houston", "txu"),
    ("london", "enk"),
    ("ottawa", "onc"),
    ("toronto", "onc"),
    ("paris", "fr "),
];

/// Frequency keywords. Longer keys come first so "semiannual" is not read
/// as "annual".
const FREQUENCY_TABLE: &[(&str, char)] = &[
    ("semiannual", 'f'),
    ("semi-annual", 'f'),
    ("biennial", 'g'),
    ("triennial", 'h'),
    ("annual", 'a'),
    ("yearbook", 'a'),
    ("year book", 'a'),
    ("semimonthly", 's'),
    ("semi-monthly", 's'),
    ("bimonthly", 'b'),
    ("bi-monthly", 'b'),
    ("monthly", 'm'),
    ("biweekly", 'e'),
    ("bi-weekly", 'e'),
    ("semiweekly", 'c'),
    ("weekly", 'w'),
    ("quarterly", 'q'),
    ("daily", 'd'),
];

/// Nature-of-contents keywords in code order.
const NATURE_TABLE: &[(&str, char)] = &[
    ("bibliograph", 'b'),
    ("catalog", 'c'),
    ("dictionar", 'd'),
    ("encyclop", 'e'),
    ("legislation", 'l'),
    ("statutes", 'l'),
    ("directory", 'r'),
    ("directories", 'r'),
    ("statistic", 's'),
    ("technical report", 't'),
    ("standards", 'u'),
    ("yearbook", 'y'),
    ("treaty", 'z'),
    ("treaties", 'z'),
];

const FEDERAL_MARKERS: &[&str] = &[
    "united states",
    "u.s.",
    "u. s.",
    "congress",
    "federal",
    "g.p.o",
    "government printing office",
    "dept. of",
    "department of",
];

const STATE_MARKERS: &[&str] = &["state of ", "commonwealth of", "general assembly", "legislature"];

const CONFERENCE_MARKERS: &[&str] = &[
    "conference",
    "symposium",
    "proceedings",
    "workshop",
    "colloquium",
    "congresses",
];

const FESTSCHRIFT_MARKERS: &[&str] = &[
    "festschrift",
    "in honor of",
    "in honour of",
    "essays presented to",
];

const FICTION_MARKERS: &[&str] = &["fiction", "novels", "a novel", "short stories"];

fn ceased_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(ceased|final\s+(report|issue|volume|edition)|last\s+issue)\b").unwrap()
    })
}

/// Date type at 008/06.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DateType {
    /// No dates known
    Unknown,
    Single,
    Multiple,
    Continuing,
    Ceased,
}

impl DateType {
    pub fn code(self) -> char {
        match self {
            DateType::Unknown => 'n',
            DateType::Single => 's',
            DateType::Multiple => 'm',
            DateType::Continuing => 'c',
            DateType::Ceased => 'd',
        }
    }

    /// Continuing and ceased hosts are serials.
    pub fn is_continuing(self) -> bool {
        matches!(self, DateType::Continuing | DateType::Ceased)
    }
}

/// Per-child evidence, lowercased once.
#[derive(Debug, Default)]
struct Evidence {
    year: Option<i32>,
    title: String,
    /// Place and publisher text
    imprint: String,
    /// 110/710 corporate names
    corporate: String,
    subjects: Vec<String>,
    language: Option<String>,
    has_sudoc: bool,
    has_meeting: bool,
}

impl Evidence {
    fn of(record: &CatalogRecord) -> Self {
        let title = descriptive::normalized_title(record).to_lowercase();
        let imprint = [descriptive::publication_place(record), descriptive::publisher(record)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let corporate = ["110", "710"]
            .into_iter()
            .flat_map(|t| record.fields_with_tag(t))
            .flat_map(|f| f.values('a'))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let subjects = ["600", "610", "650", "651", "655"]
            .into_iter()
            .flat_map(|t| record.fields_with_tag(t))
            .flat_map(|f| f.subfields().into_iter().flatten())
            .filter(|sf| sf.code.is_ascii_lowercase())
            .map(|sf| sf.value.to_lowercase())
            .collect();
        Self {
            year: descriptive::publication_year(record),
            title,
            imprint,
            corporate,
            subjects,
            language: descriptive::language(record),
            has_sudoc: record.first_field("086").is_some(),
            has_meeting: record.first_field("111").is_some() || record.first_field("711").is_some(),
        }
    }

    fn text_has(&self, markers: &[&str]) -> bool {
        markers
            .iter()
            .any(|m| self.title.contains(m) || self.subjects.iter().any(|s| s.contains(m)))
    }
}

/// Fixed-field values derived from a set of children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FixedFieldAnalysis {
    pub date_type: DateType,
    pub date1: String,
    pub date2: String,
    pub place: String,
    /// Frequency code, blank when none applies
    pub frequency: char,
    pub nature_of_contents: Vec<char>,
    pub government_publication: char,
    pub conference: bool,
    pub festschrift: bool,
    pub index: bool,
    pub fiction: bool,
    pub biography: char,
    pub language: String,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

impl FixedFieldAnalysis {
    pub fn from_children(children: &[CatalogRecord], default_language: &str) -> Self {
        let evidence: Vec<Evidence> = children.iter().map(Evidence::of).collect();

        let years: BTreeSet<i32> = evidence.iter().filter_map(|e| e.year).collect();
        let first_year = years.first().copied();
        let last_year = years.last().copied();

        let keyword_frequency = majority(evidence.iter().filter_map(|e| frequency_keyword(&e.title)));
        let ceased = evidence.iter().any(|e| ceased_regex().is_match(&e.title));

        let (date_type, date1, date2) = match (first_year, last_year) {
            (None, _) | (_, None) => (DateType::Unknown, "uuuu".to_string(), "uuuu".to_string()),
            (Some(a), Some(b)) if a == b => (DateType::Single, a.to_string(), "    ".to_string()),
            (Some(a), Some(b)) => match (keyword_frequency, ceased) {
                (Some(_), true) => (DateType::Ceased, a.to_string(), b.to_string()),
                (Some(_), false) => (DateType::Continuing, a.to_string(), "9999".to_string()),
                (None, _) => (DateType::Multiple, a.to_string(), b.to_string()),
            },
        };

        let frequency = match keyword_frequency {
            Some(code) => code,
            None if years.len() > 1 => 'a',
            None => ' ',
        };

        let place = majority(evidence.iter().filter_map(|e| place_code(&e.imprint)))
            .unwrap_or(UNKNOWN_PLACE)
            .to_string();

        let mut nature_of_contents = Vec::new();
        for (keyword, code) in NATURE_TABLE {
            if nature_of_contents.len() == 4 {
                break;
            }
            if !nature_of_contents.contains(code) && evidence.iter().any(|e| e.text_has(&[*keyword])) {
                nature_of_contents.push(*code);
            }
        }

        let government_publication = if evidence.iter().any(|e| {
            e.has_sudoc
                || FEDERAL_MARKERS
                    .iter()
                    .any(|m| e.imprint.contains(m) || e.corporate.contains(m))
        }) {
            'f'
        } else if evidence.iter().any(|e| {
            STATE_MARKERS
                .iter()
                .any(|m| e.imprint.contains(m) || e.corporate.contains(m))
        }) {
            's'
        } else {
            ' '
        };

        let conference = evidence
            .iter()
            .any(|e| e.has_meeting || e.text_has(CONFERENCE_MARKERS));
        let festschrift = evidence.iter().any(|e| e.text_has(FESTSCHRIFT_MARKERS));
        let index = evidence.iter().any(|e| e.text_has(&["index"]));
        let fiction = evidence.iter().any(|e| e.subjects.iter().any(|s| FICTION_MARKERS.iter().any(|m| s.contains(m))));
        let biography = if evidence.iter().any(|e| e.text_has(&["autobiograph"])) {
            'a'
        } else if evidence.iter().any(|e| e.text_has(&["biograph"])) {
            'd'
        } else {
            ' '
        };

        let language = majority(evidence.iter().filter_map(|e| e.language.as_deref()))
            .unwrap_or(default_language)
            .to_string();

        Self {
            date_type,
            date1,
            date2,
            place,
            frequency,
            nature_of_contents,
            government_publication,
            conference,
            festschrift,
            index,
            fiction,
            biography,
            language,
            first_year,
            last_year,
        }
    }

    pub fn is_continuing(&self) -> bool {
        self.date_type.is_continuing()
    }

    /// `1990-1995`, `1990`, or `None` when no year is known.
    pub fn year_range(&self) -> Option<String> {
        match (self.first_year, self.last_year) {
            (Some(a), Some(b)) if a != b => Some(format!("{a}-{b}")),
            (Some(a), _) => Some(a.to_string()),
            _ => None,
        }
    }

    /// Render the 40-character 008.
    pub fn render(&self, entered: NaiveDate) -> String {
        let mut out = String::with_capacity(FIXED_FIELD_LEN);
        out.push_str(&entered.format("%y%m%d").to_string());
        out.push(self.date_type.code());
        out.push_str(&fit(&self.date1, 4));
        out.push_str(&fit(&self.date2, 4));
        out.push_str(&fit(&self.place, 3));
        if self.is_continuing() {
            self.push_continuing_block(&mut out);
        } else {
            self.push_books_block(&mut out);
        }
        out.push_str(&fit(&self.language, 3));
        out.push(' ');
        out.push('d');
        out
    }

    // 18-34 for books
    fn push_books_block(&self, out: &mut String) {
        out.push_str("    "); // illustrations
        out.push(' '); // audience
        out.push(' '); // form of item
        out.push_str(&fit(&self.nature_of_contents.iter().collect::<String>(), 4));
        out.push(self.government_publication);
        out.push(flag(self.conference));
        out.push(flag(self.festschrift));
        out.push(flag(self.index));
        out.push(' ');
        out.push(flag(self.fiction));
        out.push(self.biography);
    }

    // 18-34 for continuing resources
    fn push_continuing_block(&self, out: &mut String) {
        out.push(self.frequency);
        out.push(if self.frequency == ' ' { 'u' } else { 'r' });
        out.push(' ');
        out.push('p');
        out.push(' '); // form of original
        out.push(' '); // form of item
        out.push(' '); // nature of entire work
        let nature: String = self.nature_of_contents.iter().take(3).collect();
        out.push_str(&fit(&nature, 3));
        out.push(self.government_publication);
        out.push(flag(self.conference));
        out.push_str("   ");
        out.push(' '); // original alphabet
        out.push('0'); // successive entry
    }
}

fn flag(b: bool) -> char {
    if b {
        '1'
    } else {
        '0'
    }
}

/// Pad with blanks or truncate to exactly `width` characters.
fn fit(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

fn frequency_keyword(title: &str) -> Option<char> {
    FREQUENCY_TABLE
        .iter()
        .find(|(k, _)| title.contains(k))
        .map(|(_, c)| *c)
}

fn place_code(imprint: &str) -> Option<&'static str> {
    PLACE_TABLE
        .iter()
        .find(|(k, _)| imprint.contains(k))
        .map(|(_, c)| *c)
}

/// Most frequent value; ties go to the value seen first.
fn majority<T: Copy + Eq + std::hash::Hash>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (i, v) in values.enumerate() {
        counts.entry(v).or_insert((0, i)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_db_core::{Field, Indicators, Tag};

    fn child(title: &str, year: &str, publisher: &str) -> CatalogRecord {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"245"), Indicators::new('1', '0')).subfield('a', title));
        rec.push(
            Field::data(Tag::from_static(b"264"), Indicators::new(' ', '1'))
                .subfield('a', "Washington :")
                .subfield('b', publisher)
                .subfield('c', year),
        );
        rec
    }

    fn entered() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn date_types() {
        let none = FixedFieldAnalysis::from_children(&[CatalogRecord::new()], "eng");
        assert_eq!(none.date_type, DateType::Unknown);
        assert_eq!(none.date1, "uuuu");

        let single = FixedFieldAnalysis::from_children(&[child("Atlas", "1990", "X")], "eng");
        assert_eq!(single.date_type, DateType::Single);
        assert_eq!(single.frequency, ' ');

        let multi = FixedFieldAnalysis::from_children(
            &[child("Atlas", "1990", "X"), child("Atlas", "1993", "X")],
            "eng",
        );
        assert_eq!(multi.date_type, DateType::Multiple);
        assert_eq!((multi.date1.as_str(), multi.date2.as_str()), ("1990", "1993"));
        assert_eq!(multi.frequency, 'a');

        let ceased = FixedFieldAnalysis::from_children(
            &[
                child("Quarterly bulletin", "1990", "X"),
                child("Quarterly bulletin, final issue", "1991", "X"),
            ],
            "eng",
        );
        assert_eq!(ceased.date_type, DateType::Ceased);
        assert_eq!(ceased.date2, "1991");
        assert_eq!(ceased.frequency, 'q');
    }

    #[test]
    fn semiannual_is_not_annual() {
        let a = FixedFieldAnalysis::from_children(
            &[child("Semiannual report", "1990", "X"), child("Semiannual report", "1991", "X")],
            "eng",
        );
        assert_eq!(a.frequency, 'f');
        assert_eq!(a.date_type, DateType::Continuing);
        assert_eq!(a.date2, "9999");
    }

    #[test]
    fn government_and_place() {
        let a = FixedFieldAnalysis::from_children(
            &[child("Atlas", "1990", "U.S. G.P.O.")],
            "eng",
        );
        assert_eq!(a.government_publication, 'f');
        assert_eq!(a.place, "dcu");

        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"110"), Indicators::new('1', ' ')).subfield('a', "Commonwealth of Virginia"));
        let s = FixedFieldAnalysis::from_children(&[rec], "eng");
        assert_eq!(s.government_publication, 's');
        assert_eq!(s.place, UNKNOWN_PLACE);
    }

    #[test]
    fn flags_from_titles_and_subjects() {
        let mut rec = child("Proceedings of the symposium on mining statistics", "1990", "X");
        rec.push(
            Field::data(Tag::from_static(b"650"), Indicators::new(' ', '0'))
                .subfield('a', "Miners")
                .subfield('v', "Biography."),
        );
        let a = FixedFieldAnalysis::from_children(&[rec], "eng");
        assert!(a.conference);
        assert!(!a.festschrift);
        assert!(!a.fiction);
        assert_eq!(a.biography, 'd');
        assert_eq!(a.nature_of_contents, vec!['s']);
    }

    #[test]
    fn language_majority_and_default() {
        let lang = |code: &str| {
            let mut rec = CatalogRecord::new();
            rec.push(Field::data(Tag::from_static(b"041"), Indicators::new('0', ' ')).subfield('a', code));
            rec
        };
        let a = FixedFieldAnalysis::from_children(&[lang("fre"), lang("spa"), lang("spa")], "eng");
        assert_eq!(a.language, "spa");
        let b = FixedFieldAnalysis::from_children(&[CatalogRecord::new()], "ger");
        assert_eq!(b.language, "ger");
    }

    #[test]
    fn render_is_forty_characters() {
        let books = FixedFieldAnalysis::from_children(&[child("Atlas", "1990", "X")], "eng");
        let s = books.render(entered());
        assert_eq!(s.len(), FIXED_FIELD_LEN);
        assert_eq!(&s[0..6], "240309");
        assert_eq!(&s[6..15], "s1990    ");
        assert_eq!(&s[15..18], "dcu");
        assert_eq!(&s[35..40], "eng d");

        let serial = FixedFieldAnalysis::from_children(
            &[child("Annual report", "1990", "X"), child("Annual report", "1992", "X")],
            "eng",
        );
        let s = serial.render(entered());
        assert_eq!(s.len(), FIXED_FIELD_LEN);
        assert_eq!(&s[6..15], "c19909999");
        assert_eq!(&s[18..20], "ar");
        assert_eq!(serial.year_range().as_deref(), Some("1990-1992"));
    }
}
