use crate::domain::model::{ParsedAddress, PostalCode};
use crate::utils::error::{Result, RouterError};
use regex::Regex;

/// 預設辨識的州名 (依序比對，先符合者優先)
pub const DEFAULT_STATES: &[&str] = &[
    "Maharashtra",
    "Delhi",
    "Karnataka",
    "West Bengal",
    "Rajasthan",
    "Gujarat",
    "Telangana",
    "Tamil Nadu",
    "Uttar Pradesh",
    "Kerala",
];

/// Splits free-form address text into street / city / state / pincode.
///
/// Heuristics, in order:
/// 1. split on runs of `,` / `;` into trimmed, non-empty fragments;
/// 2. the first fragment holding six consecutive digits yields the pincode
///    (the first run wins; digit runs in later fragments are ignored);
/// 3. the first fragment containing a known state name (case-insensitive
///    substring) yields the state;
/// 4. of what is left, the first fragment is the street and the last the
///    city. Fragments in between are dropped. A lone fragment is a street
///    when it has at least three words, otherwise a city.
///
/// Substring matching means a city whose name contains a state name
/// ("New Delhi") gets that part read as the state.
#[derive(Debug, Clone)]
pub struct AddressSegmenter {
    delimiter: Regex,
    pincode: Regex,
    states: Vec<(String, Regex)>,
}

impl AddressSegmenter {
    pub fn new() -> Result<Self> {
        Self::with_states(DEFAULT_STATES.iter().copied())
    }

    pub fn with_states<I, S>(states: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let states = states
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|name| {
                let pattern = Regex::new(&format!("(?i){}", regex::escape(&name)))?;
                Ok((name, pattern))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            delimiter: Regex::new(r"[;,]+")?,
            // 只接受 ASCII 數字，且不要求字詞邊界
            pincode: Regex::new(r"[0-9]{6}")?,
            states,
        })
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(name, _)| name.as_str())
    }

    pub fn segment(&self, raw_text: &str) -> Result<ParsedAddress> {
        if raw_text.is_empty() {
            return Err(RouterError::invalid_input("address text is empty"));
        }
        let text = raw_text.trim();

        let mut parts: Vec<String> = self
            .delimiter
            .split(text)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();

        let pincode = self.take_pincode(&mut parts);
        let state = self.take_state(&mut parts);

        let (street, city) = match parts.len() {
            0 => (None, None),
            1 => {
                let only = parts.remove(0);
                if only.split_whitespace().count() >= 3 {
                    (Some(only), None)
                } else {
                    (None, Some(only))
                }
            }
            _ => {
                let city = parts.pop();
                (Some(parts.remove(0)), city)
            }
        };

        tracing::debug!(
            street = ?street,
            city = ?city,
            state = ?state,
            pincode = ?pincode,
            "segmented address"
        );

        Ok(ParsedAddress {
            street,
            city,
            state,
            pincode,
        })
    }

    fn take_pincode(&self, parts: &mut Vec<String>) -> Option<PostalCode> {
        for index in 0..parts.len() {
            let Some(found) = self.pincode.find(&parts[index]) else {
                continue;
            };
            let code = PostalCode::parse(found.as_str());

            // 同一段落中的其他 6 位數字一併移除
            let rest = self.pincode.replace_all(&parts[index], "").trim().to_string();
            replace_or_drop(parts, index, rest);
            return code;
        }
        None
    }

    fn take_state(&self, parts: &mut Vec<String>) -> Option<String> {
        for index in 0..parts.len() {
            for (name, pattern) in &self.states {
                let Some(found) = pattern.find(&parts[index]) else {
                    continue;
                };
                let part = &parts[index];
                let rest = format!("{}{}", &part[..found.start()], &part[found.end()..])
                    .trim()
                    .to_string();
                let state = name.clone();
                replace_or_drop(parts, index, rest);
                return Some(state);
            }
        }
        None
    }
}

fn replace_or_drop(parts: &mut Vec<String>, index: usize, rest: String) {
    if rest.is_empty() {
        parts.remove(index);
    } else {
        parts[index] = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> AddressSegmenter {
        AddressSegmenter::new().unwrap()
    }

    #[test]
    fn test_segment_full_address() {
        let parsed = segmenter()
            .segment("123 Ganesh Peth, Pune, Maharashtra 411002")
            .unwrap();

        assert_eq!(parsed.street.as_deref(), Some("123 Ganesh Peth"));
        assert_eq!(parsed.city.as_deref(), Some("Pune"));
        assert_eq!(parsed.state.as_deref(), Some("Maharashtra"));
        assert_eq!(parsed.pincode.as_ref().map(|c| c.as_str()), Some("411002"));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            segmenter().segment(""),
            Err(RouterError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_blank_input_yields_empty_address() {
        // 只有空白或分隔符號：不是錯誤，所有欄位為 None
        assert_eq!(segmenter().segment("   \t").unwrap(), ParsedAddress::default());
        assert_eq!(segmenter().segment(" ,;, ").unwrap(), ParsedAddress::default());
    }

    #[test]
    fn test_semicolons_and_delimiter_runs() {
        let parsed = segmenter()
            .segment("Flat 4, MG Road;; ,Bangalore; Karnataka; 560001")
            .unwrap();
        assert_eq!(parsed.street.as_deref(), Some("Flat 4"));
        assert_eq!(parsed.city.as_deref(), Some("Bangalore"));
        assert_eq!(parsed.state.as_deref(), Some("Karnataka"));
        assert_eq!(parsed.pincode.unwrap().as_str(), "560001");
    }

    #[test]
    fn test_middle_fragments_are_dropped() {
        let parsed = segmenter()
            .segment("12 Park Lane, Near City Mall, Sector 5, Kolkata")
            .unwrap();
        assert_eq!(parsed.street.as_deref(), Some("12 Park Lane"));
        assert_eq!(parsed.city.as_deref(), Some("Kolkata"));
        assert_eq!(parsed.state, None);
        assert_eq!(parsed.pincode, None);
    }

    #[test]
    fn test_only_first_pincode_is_taken() {
        let parsed = segmenter()
            .segment("Shop 7, Nashik 422001, Old code 411002")
            .unwrap();
        assert_eq!(parsed.pincode.unwrap().as_str(), "422001");
        assert_eq!(parsed.street.as_deref(), Some("Shop 7"));
        assert_eq!(parsed.city.as_deref(), Some("Old code 411002"));
    }

    #[test]
    fn test_pincode_embedded_in_longer_number() {
        let parsed = segmenter().segment("Ref 41100299, Pune").unwrap();
        assert_eq!(parsed.pincode.unwrap().as_str(), "411002");
        assert_eq!(parsed.street.as_deref(), Some("Ref 99"));
        assert_eq!(parsed.city.as_deref(), Some("Pune"));
    }

    #[test]
    fn test_pincode_only_fragment_is_dropped() {
        let parsed = segmenter().segment("Jaipur, 302001").unwrap();
        assert_eq!(parsed.pincode.unwrap().as_str(), "302001");
        assert_eq!(parsed.city.as_deref(), Some("Jaipur"));
        assert_eq!(parsed.street, None);
    }

    #[test]
    fn test_state_match_is_case_insensitive() {
        let parsed = segmenter().segment("Andheri East, mumbai MAHARASHTRA").unwrap();
        assert_eq!(parsed.state.as_deref(), Some("Maharashtra"));
        assert_eq!(parsed.street.as_deref(), Some("Andheri East"));
        assert_eq!(parsed.city.as_deref(), Some("mumbai"));
    }

    #[test]
    fn test_state_substring_inside_city_name() {
        // "New Delhi" 會被拆成州名 Delhi 與剩下的 "New"
        let parsed = segmenter().segment("Connaught Place, New Delhi 110001").unwrap();
        assert_eq!(parsed.state.as_deref(), Some("Delhi"));
        assert_eq!(parsed.city.as_deref(), Some("New"));
        assert_eq!(parsed.street.as_deref(), Some("Connaught Place"));
    }

    #[test]
    fn test_single_fragment_classification() {
        let street = segmenter().segment("221B Baker Street 411001").unwrap();
        assert_eq!(street.street.as_deref(), Some("221B Baker Street"));
        assert_eq!(street.city, None);

        let city = segmenter().segment("Navi Mumbai").unwrap();
        assert_eq!(city.city.as_deref(), Some("Navi Mumbai"));
        assert_eq!(city.street, None);
    }

    #[test]
    fn test_nothing_left_after_extraction() {
        let parsed = segmenter().segment("Kerala, 695001").unwrap();
        assert_eq!(parsed.state.as_deref(), Some("Kerala"));
        assert_eq!(parsed.pincode.unwrap().as_str(), "695001");
        assert_eq!(parsed.street, None);
        assert_eq!(parsed.city, None);
    }

    #[test]
    fn test_custom_state_list() {
        let segmenter = AddressSegmenter::with_states(["Goa", "  ", "Punjab"]).unwrap();
        assert_eq!(segmenter.states().collect::<Vec<_>>(), vec!["Goa", "Punjab"]);

        let parsed = segmenter.segment("Calangute Beach Road, Goa").unwrap();
        assert_eq!(parsed.state.as_deref(), Some("Goa"));
        assert_eq!(parsed.street.as_deref(), Some("Calangute Beach Road"));
    }
}
