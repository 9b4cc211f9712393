// src/models/station.rs

//! Static table of BBC radio stations.
//!
//! Stations are keyed by a short name (e.g. `"r4"`), carry the upstream
//! channel PID and the schedule-URL slug. Some stations broadcast in
//! several variants (FM/LW, regional transmitters); the FM/canonical
//! variant is always listed last so that title lookup lands on it.

use crate::error::{Error, Result};

/// Broad station category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKind {
    National,
    Regional,
    Local,
}

/// One station in the static table. Immutable, loaded once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationRef {
    /// Short lookup key, e.g. `"r4"`
    pub key: &'static str,
    /// Upstream channel PID, e.g. `"p00fzl7j"`
    pub id: &'static str,
    /// Display title, e.g. `"BBC Radio 4"`
    pub title: &'static str,
    /// Listings URL slug, e.g. `"radio4/programmes/schedules/fm"`
    pub slug: &'static str,
    pub kind: StationKind,
}

use StationKind::{Local, National, Regional};

const STATIONS: &[StationRef] = &[
    // National. CBeebies Radio is present for completeness but excluded
    // from catalogue sweeps (it does not parse to a catalogue upstream).
    s("r1x", "p00fzl64", "BBC Radio 1Xtra", "1xtra/programmes/schedules", National),
    s("r5l", "p00fzl7g", "BBC Radio 5 live", "5live/programmes/schedules", National),
    s("r5lse", "p00fzl7h", "BBC Radio 5 live sports extra", "5livesportsextra/programmes/schedules", National),
    s("r6m", "p00fzl65", "BBC Radio 6 Music", "6music/programmes/schedules", National),
    s("an", "p00fzl68", "BBC Asian Network", "asiannetwork/programmes/schedules", National),
    s("r1", "p00fzl86", "BBC Radio 1", "radio1/programmes/schedules", National),
    s("r2", "p00fzl8v", "BBC Radio 2", "radio2/programmes/schedules", National),
    s("r3", "p00fzl8t", "BBC Radio 3", "radio3/programmes/schedules", National),
    s("r4lw", "p00fzl7k", "BBC Radio 4", "radio4/programmes/schedules/lw", National),
    s("r4", "p00fzl7j", "BBC Radio 4", "radio4/programmes/schedules/fm", National),
    s("r4x", "p00fzl7l", "BBC Radio 4 Extra", "radio4extra/programmes/schedules", National),
    s("ws", "p02zbmb3", "BBC World Service", "worldserviceradio/programmes/schedules/uk", National),
    s("cr", "p02jf21y", "CBeebies Radio", "cbeebies_radio/programmes/schedules", National),
    // Regional
    s("rc", "p00fzl7b", "BBC Radio Cymru", "radiocymru/programmes/schedules", Regional),
    s("rf", "p00fzl7m", "BBC Radio Foyle", "radiofoyle/programmes/schedules", Regional),
    s("rng", "p00fzl81", "BBC Radio Nan Gaidheal", "radionangaidheal/programmes/schedules", Regional),
    s("rss", "p00fzl8j", "BBC Radio Scotland", "radioscotland/programmes/schedules/shetland", Regional),
    s("rso", "p00fzl8b", "BBC Radio Scotland", "radioscotland/programmes/schedules/orkney", Regional),
    s("rsmw", "p00fzl8g", "BBC Radio Scotland", "radioscotland/programmes/schedules/mw", Regional),
    s("rs", "p00fzl8d", "BBC Radio Scotland", "radioscotland/programmes/schedules/fm", Regional),
    s("ru", "p00fzl8w", "BBC Radio Ulster", "radioulster/programmes/schedules", Regional),
    s("rwmw", "p00fzl8x", "BBC Radio Wales", "radiowales/programmes/schedules/mw", Regional),
    s("rw", "p00fzl8y", "BBC Radio Wales", "radiowales/programmes/schedules/fm", Regional),
    // Local
    s("cov", "p00fzl78", "BBC Coventry & Warwickshire", "bbccoventryandwarwickshire/programmes/schedules", Local),
    s("ess", "p00fzl7f", "BBC Essex", "bbcessex/programmes/schedules", Local),
    s("her", "p00fzl7q", "BBC Hereford & Worcester", "bbcherefordandworcester/programmes/schedules", Local),
    s("new", "p00fzl82", "BBC Newcastle", "bbcnewcastle/programmes/schedules", Local),
    s("som", "p00fzl8m", "BBC Somerset", "bbcsomerset/programmes/schedules", Local),
    s("sur", "p00fzl8q", "BBC Surrey", "bbcsurrey/programmes/schedules", Local),
    s("sus", "p00fzl8r", "BBC Sussex", "bbcsussex/programmes/schedules", Local),
    s("tee", "p00fzl93", "BBC Tees", "bbctees/programmes/schedules", Local),
    s("wil", "p00fzl8z", "BBC Wiltshire", "bbcwiltshire/programmes/schedules", Local),
    s("ber", "p00fzl74", "BBC Radio Berkshire", "radioberkshire/programmes/schedules", Local),
    s("bri", "p00fzl75", "BBC Radio Bristol", "radiobristol/programmes/schedules", Local),
    s("cam", "p00fzl76", "BBC Radio Cambridgeshire", "radiocambridgeshire/programmes/schedules", Local),
    s("cor", "p00fzl77", "BBC Radio Cornwall", "radiocornwall/programmes/schedules", Local),
    s("cum", "p00fzl79", "BBC Radio Cumbria", "radiocumbria/programmes/schedules", Local),
    s("der", "p00fzl7c", "BBC Radio Derby", "radioderby/programmes/schedules", Local),
    s("dev", "p00fzl7d", "BBC Radio Devon", "radiodevon/programmes/schedules", Local),
    s("glo", "p00fzl7n", "BBC Radio Gloucestershire", "radiogloucestershire/programmes/schedules", Local),
    s("gue", "p00fzl7p", "BBC Radio Guernsey", "radioguernsey/programmes/schedules", Local),
    s("hum", "p00fzl7r", "BBC Radio Humberside", "radiohumberside/programmes/schedules", Local),
    s("jer", "p00fzl7s", "BBC Radio Jersey", "radiojersey/programmes/schedules", Local),
    s("ken", "p00fzl7t", "BBC Radio Kent", "radiokent/programmes/schedules", Local),
    s("lan", "p00fzl7v", "BBC Radio Lancashire", "radiolancashire/programmes/schedules", Local),
    s("lee", "p00fzl7w", "BBC Radio Leeds", "radioleeds/programmes/schedules", Local),
    s("lei", "p00fzl7x", "BBC Radio Leicester", "radioleicester/programmes/schedules", Local),
    s("lin", "p00fzl7y", "BBC Radio Lincolnshire", "radiolincolnshire/programmes/schedules", Local),
    s("lon", "p00fzl6f", "BBC Radio London", "radiolondon/programmes/schedules", Local),
    s("man", "p00fzl7z", "BBC Radio Manchester", "radiomanchester/programmes/schedules", Local),
    s("mer", "p00fzl80", "BBC Radio Merseyside", "radiomerseyside/programmes/schedules", Local),
    s("nfk", "p00fzl83", "BBC Radio Norfolk", "radionorfolk/programmes/schedules", Local),
    s("nth", "p00fzl84", "BBC Radio Northampton", "radionorthampton/programmes/schedules", Local),
    s("ntt", "p00fzl85", "BBC Radio Nottingham", "radionottingham/programmes/schedules", Local),
    s("oxf", "p00fzl8c", "BBC Radio Oxford", "radiooxford/programmes/schedules", Local),
    s("she", "p00fzl8h", "BBC Radio Sheffield", "radiosheffield/programmes/schedules", Local),
    s("shr", "p00fzl8k", "BBC Radio Shropshire", "radioshropshire/programmes/schedules", Local),
    s("sol", "p00fzl8l", "BBC Radio Solent", "radiosolent/programmes/schedules", Local),
    s("sto", "p00fzl8n", "BBC Radio Stoke", "radiostoke/programmes/schedules", Local),
    s("suf", "p00fzl8p", "BBC Radio Suffolk", "radiosuffolk/programmes/schedules", Local),
    s("yor", "p00fzl90", "BBC Radio York", "radioyork/programmes/schedules", Local),
    s("tcr", "p00fzl96", "BBC Three Counties Radio", "threecountiesradio/programmes/schedules", Local),
    s("wm", "p00fzl9f", "BBC WM 95.6", "wm/programmes/schedules", Local),
];

const fn s(
    key: &'static str,
    id: &'static str,
    title: &'static str,
    slug: &'static str,
    kind: StationKind,
) -> StationRef {
    StationRef {
        key,
        id,
        title,
        slug,
        kind,
    }
}

/// The full station table in declaration order.
pub fn stations() -> &'static [StationRef] {
    STATIONS
}

impl StationRef {
    /// Look up a station by its short key.
    pub fn by_key(key: &str) -> Result<&'static StationRef> {
        Self::try_by_key(key).ok_or_else(|| Error::not_found(key, "station table (by key)"))
    }

    /// Non-throwing variant of [`StationRef::by_key`].
    pub fn try_by_key(key: &str) -> Option<&'static StationRef> {
        STATIONS.iter().find(|st| st.key == key)
    }

    /// Look up a station by its channel PID.
    pub fn by_id(id: &str) -> Result<&'static StationRef> {
        STATIONS
            .iter()
            .find(|st| st.id == id)
            .ok_or_else(|| Error::not_found(id, "station table (by id)"))
    }

    /// Look up a station by display title. Where several variants share a
    /// title the canonical (last-listed) one wins.
    pub fn by_title(title: &str) -> Result<&'static StationRef> {
        STATIONS
            .iter()
            .rev()
            .find(|st| st.title == title)
            .ok_or_else(|| Error::not_found(title, "station table (by title)"))
    }

    /// Station keys for the given categories, sorted. With
    /// `dedup_variants`, only the canonical variant of each title is kept.
    /// CBeebies Radio is always excluded (it has no programme catalogue).
    pub fn keys_by_kind(kinds: &[StationKind], dedup_variants: bool) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = STATIONS
            .iter()
            .filter(|st| kinds.contains(&st.kind) && st.key != "cr")
            .filter(|st| {
                !dedup_variants
                    || Self::by_title(st.title).map(|c| c.key == st.key).unwrap_or(true)
            })
            .map(|st| st.key)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Schedule page URL for this station, optionally for a specific day.
    pub fn schedule_url(&self, date: Option<chrono::NaiveDate>) -> String {
        let base = format!("https://www.bbc.co.uk/schedules/{}", self.id);
        match date {
            Some(d) => format!("{base}/{}", crate::utils::time::cal_path(d)),
            None => base,
        }
    }
}
