//! Canonical star names from raw identifier strings.
//!
//! Every candidate identifier gets a score: well-known proper names beat
//! Bayer/Flamsteed expansions, which beat catalog designations, which beat
//! whatever is left. The catalog ranking is a data-driven ordered table of
//! (pattern, score, optional normalizer) entries evaluated in order. Ties
//! keep the first candidate in pool order, so resolution is stable.

use crate::crossmatch::CrossmatchRecord;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Three-letter Greek abbreviation to full letter name.
const GREEK_3_TO_FULL: &[(&str, &str)] = &[
    ("alf", "Alpha"),
    ("bet", "Beta"),
    ("gam", "Gamma"),
    ("del", "Delta"),
    ("eps", "Epsilon"),
    ("zet", "Zeta"),
    ("eta", "Eta"),
    ("the", "Theta"),
    ("iot", "Iota"),
    ("kap", "Kappa"),
    ("lam", "Lambda"),
    ("mu", "Mu"),
    ("nu", "Nu"),
    ("xi", "Xi"),
    ("omi", "Omicron"),
    ("pi", "Pi"),
    ("rho", "Rho"),
    ("sig", "Sigma"),
    ("tau", "Tau"),
    ("ups", "Upsilon"),
    ("phi", "Phi"),
    ("chi", "Chi"),
    ("psi", "Psi"),
    ("ome", "Omega"),
];

/// IAU three-letter constellation abbreviation to Latin genitive.
const CONSTELLATION_GENITIVE: &[(&str, &str)] = &[
    ("And", "Andromedae"),
    ("Ant", "Antliae"),
    ("Aps", "Apodis"),
    ("Aql", "Aquilae"),
    ("Aqr", "Aquarii"),
    ("Ara", "Arae"),
    ("Ari", "Arietis"),
    ("Aur", "Aurigae"),
    ("Boo", "Bootis"),
    ("CMa", "Canis Majoris"),
    ("CMi", "Canis Minoris"),
    ("CVn", "Canum Venaticorum"),
    ("Cae", "Caeli"),
    ("Cam", "Camelopardalis"),
    ("Cap", "Capricorni"),
    ("Car", "Carinae"),
    ("Cas", "Cassiopeiae"),
    ("Cen", "Centauri"),
    ("Cep", "Cephei"),
    ("Cet", "Ceti"),
    ("Cha", "Chamaeleontis"),
    ("Cir", "Circini"),
    ("Cnc", "Cancri"),
    ("Col", "Columbae"),
    ("Com", "Comae Berenices"),
    ("CrA", "Coronae Australis"),
    ("CrB", "Coronae Borealis"),
    ("Crt", "Crateris"),
    ("Cru", "Crucis"),
    ("Crv", "Corvi"),
    ("Cyg", "Cygni"),
    ("Del", "Delphini"),
    ("Dor", "Doradus"),
    ("Dra", "Draconis"),
    ("Equ", "Equulei"),
    ("Eri", "Eridani"),
    ("For", "Fornacis"),
    ("Gem", "Geminorum"),
    ("Gru", "Gruis"),
    ("Her", "Herculis"),
    ("Hor", "Horologii"),
    ("Hya", "Hydrae"),
    ("Hyi", "Hydri"),
    ("Ind", "Indi"),
    ("LMi", "Leonis Minoris"),
    ("Lac", "Lacertae"),
    ("Leo", "Leonis"),
    ("Lep", "Leporis"),
    ("Lib", "Librae"),
    ("Lup", "Lupi"),
    ("Lyn", "Lyncis"),
    ("Lyr", "Lyrae"),
    ("Men", "Mensae"),
    ("Mic", "Microscopii"),
    ("Mon", "Monocerotis"),
    ("Mus", "Muscae"),
    ("Nor", "Normae"),
    ("Oct", "Octantis"),
    ("Oph", "Ophiuchi"),
    ("Ori", "Orionis"),
    ("Pav", "Pavonis"),
    ("Peg", "Pegasi"),
    ("Per", "Persei"),
    ("Phe", "Phoenicis"),
    ("Pic", "Pictoris"),
    ("PsA", "Piscis Austrini"),
    ("Psc", "Piscium"),
    ("Pup", "Puppis"),
    ("Pyx", "Pyxidis"),
    ("Ret", "Reticuli"),
    ("Scl", "Sculptoris"),
    ("Sco", "Scorpii"),
    ("Sct", "Scuti"),
    ("Ser", "Serpentis"),
    ("Sex", "Sextantis"),
    ("Sge", "Sagittae"),
    ("Sgr", "Sagittarii"),
    ("Tau", "Tauri"),
    ("Tel", "Telescopii"),
    ("TrA", "Trianguli Australis"),
    ("Tri", "Trianguli"),
    ("Tuc", "Tucanae"),
    ("UMa", "Ursae Majoris"),
    ("UMi", "Ursae Minoris"),
    ("Vel", "Velorum"),
    ("Vir", "Virginis"),
    ("Vol", "Volantis"),
    ("Vul", "Vulpeculae"),
];

/// Proper names preferred over Bayer designations for everyday readability.
const WELL_KNOWN_PROPER: &[&str] = &[
    "Sirius",
    "Canopus",
    "Arcturus",
    "Vega",
    "Capella",
    "Rigel",
    "Procyon",
    "Betelgeuse",
    "Aldebaran",
    "Altair",
    "Spica",
    "Antares",
    "Pollux",
    "Fomalhaut",
    "Deneb",
    "Regulus",
    "Castor",
    "Achernar",
    "Hadar",
    "Mimosa",
    "Bellatrix",
    "Elnath",
    "Alnitak",
    "Alnilam",
    "Mintaka",
    "Proxima Centauri",
    "Barnard's Star",
    // Prefer full Bayer for these nearby targets
    "Alpha Centauri",
    "Tau Ceti",
    "Epsilon Indi",
];

pub const PROPER_NAME_SCORE: i32 = 120;
pub const BAYER_FLAMSTEED_SCORE: i32 = 110;
pub const FALLBACK_SCORE: i32 = 40;

struct CatalogRank {
    pattern: Regex,
    score: i32,
    normalize: Option<fn(&str) -> String>,
}

lazy_static! {
    /// Classification prefixes like "* alf CMa" or "V* bet Ori".
    static ref BAD_PREFIX: Regex = Regex::new(r"^(?:\*|V\*|\*\*|Cl\*)\s*").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref BAYER_TOKEN: Regex = Regex::new(r"^([A-Za-z]{3})(\d{0,2})$").unwrap();
    static ref GLIESE_PREFIX: Regex = Regex::new(r"(?i)gliese\s*").unwrap();

    /// Catalog ranking table, evaluated in order. Higher scores are better,
    /// but all rank below proper names and Bayer/Flamsteed expansions.
    static ref CATALOG_RANKS: Vec<CatalogRank> = vec![
        rank(r"(?i)^\s*GJ\s*\d+\w*$", 88, Some(normalize_gj)),
        rank(r"(?i)^\s*GLIESE\s*\d+\w*$", 88, Some(normalize_gliese)),
        rank(r"(?i)^\s*HR\s*\d+\s*$", 84, None),
        rank(r"(?i)^\s*HD\s*\d+\s*$", 82, None),
        rank(r"(?i)^\s*HIP\s*\d+\s*$", 80, None),
        rank(r"(?i)^\s*(BD|CD|CPD)\s*[+-]?\s*\d+\s*\d+\s*$", 70, None),
        rank(r"(?i)^\s*(LHS|LP|LTT|L|Wolf|Ross|G)\s+[-\d ]+\w*$", 68, None),
        rank(r"(?i)^\s*TYC\s*\d+-\d+-\d+\s*$", 60, None),
        rank(r"(?i)^\s*2MASS\s+", 30, None),
    ];

    static ref GREEK_MAP: HashMap<&'static str, &'static str> =
        GREEK_3_TO_FULL.iter().copied().collect();
    static ref GENITIVE_MAP: HashMap<&'static str, &'static str> =
        CONSTELLATION_GENITIVE.iter().copied().collect();
}

fn rank(pattern: &str, score: i32, normalize: Option<fn(&str) -> String>) -> CatalogRank {
    CatalogRank {
        pattern: Regex::new(pattern).unwrap(),
        score,
        normalize,
    }
}

/// Unify GJ spelling variants ("Gliese 699", "GL 699") to the "GJ" prefix.
fn normalize_gj(s: &str) -> String {
    clean_spaces(&s.to_uppercase().replace("GLIESE", "GJ").replace("GL", "GJ"))
}

fn normalize_gliese(s: &str) -> String {
    clean_spaces(&format!("GJ {}", GLIESE_PREFIX.replace_all(s, "")))
}

fn clean_spaces(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

fn strip_bad_prefix(s: &str) -> String {
    clean_spaces(&BAD_PREFIX.replace(s, ""))
}

/// Expands abbreviated Bayer/Flamsteed designations:
///
/// - "alf Cen"    -> "Alpha Centauri"
/// - "tau Cet"    -> "Tau Ceti"
/// - "61 Cyg"     -> "61 Cygni"
/// - "alf1 Cen A" -> "Alpha1 Centauri A"
///
/// Returns `None` if the pattern is not recognized.
pub fn expand_bayer_flamsteed(text: &str) -> Option<String> {
    let s = strip_bad_prefix(text);
    let parts: Vec<&str> = s.split(' ').collect();
    if parts.len() < 2 {
        return None;
    }

    let first = parts[0];
    let constellation = parts[1];
    let component = parts[2..].join(" ");
    let genitive = *GENITIVE_MAP.get(constellation)?;

    // Flamsteed number?
    if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
        return Some(with_component(format!("{} {}", first, genitive), &component));
    }

    // Bayer: three-letter Greek code + optional superscript digits.
    let caps = BAYER_TOKEN.captures(first)?;
    let greek_full = *GREEK_MAP.get(caps[1].to_lowercase().as_str())?;
    let superscript = &caps[2];
    Some(with_component(
        format!("{}{} {}", greek_full, superscript, genitive),
        &component,
    ))
}

fn with_component(name: String, component: &str) -> String {
    format!("{} {}", name, component).trim().to_string()
}

/// Assigns a score and normalized label to one identifier. Higher is better.
pub fn score_identifier(raw: &str) -> (i32, String) {
    let s = strip_bad_prefix(raw);
    if s.is_empty() {
        return (0, String::new());
    }

    if WELL_KNOWN_PROPER.contains(&s.as_str()) {
        return (PROPER_NAME_SCORE, s);
    }

    if let Some(expanded) = expand_bayer_flamsteed(&s) {
        return (BAYER_FLAMSTEED_SCORE, expanded);
    }

    for entry in CATALOG_RANKS.iter() {
        if entry.pattern.is_match(&s) {
            let label = match entry.normalize {
                Some(normalize) => normalize(&s),
                None => s.clone(),
            };
            return (entry.score, clean_spaces(&label));
        }
    }

    (FALLBACK_SCORE, s)
}

/// Chooses the best display name from a candidate pool: the primary id, every
/// "|"-delimited alias (a leading "NAME " marker contributes the remainder),
/// and the original query identifier as a guaranteed non-empty fallback.
pub fn pick_best_name(
    main_id: Option<&str>,
    aliases: Option<&str>,
    fallback_query_id: &str,
) -> String {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(main_id) = main_id {
        candidates.push(main_id.trim().to_string());
    }

    if let Some(aliases) = aliases {
        for ident in aliases.split('|') {
            let ident = ident.trim();
            if ident.is_empty() {
                continue;
            }
            match ident.strip_prefix("NAME ") {
                Some(rest) => candidates.push(rest.trim().to_string()),
                None => candidates.push(ident.to_string()),
            }
        }
    }

    candidates.push(fallback_query_id.to_string());

    let mut best_score = -1;
    let mut best_label = fallback_query_id.to_string();
    for candidate in &candidates {
        let (score, label) = score_identifier(candidate);
        if !label.is_empty() && score > best_score {
            best_score = score;
            best_label = label;
        }
    }
    best_label
}

/// Resolves display names for every target that has a cross-match record.
///
/// Targets without a record stay unresolved; the row adapter falls back to
/// their query identifier downstream.
pub fn resolve_names(
    targets: &[(i64, String)],
    records: &HashMap<i64, CrossmatchRecord>,
) -> HashMap<i64, String> {
    let mut names = HashMap::new();
    for (sid, query_id) in targets {
        if let Some(record) = records.get(sid) {
            let name = pick_best_name(
                record.main_id.as_deref(),
                record.aliases.as_deref(),
                query_id,
            );
            names.insert(*sid, name);
        }
    }
    names
}
