use serde::Serialize;

use crate::spotify::Artist;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub label: String,
    pub count: u32,
}

/// Genre frequencies across `artists`, in first-seen order.
///
/// Genres differing only in case are counted together under a label with the
/// first letter upper-cased and the rest lower-cased.
pub fn histogram(artists: &[Artist]) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = Vec::new();

    for genre in artists.iter().flat_map(|a| a.genres.iter()) {
        let label = capitalize(genre);
        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(GenreCount { label, count: 1 }),
        }
    }

    counts
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(name: &str, genres: &[&str]) -> Artist {
        Artist {
            id: name.to_lowercase(),
            name: name.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn test_case_variants_merge() {
        let artists = vec![artist("A", &["Pop", "pop"]), artist("B", &["Rock"])];
        assert_eq!(
            histogram(&artists),
            vec![
                GenreCount { label: "Pop".into(), count: 2 },
                GenreCount { label: "Rock".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_multiword_genres_capitalize_first_letter_only() {
        let artists = vec![artist("A", &["hip hop"]), artist("B", &["Hip Hop", "indie rock"])];
        let h = histogram(&artists);
        assert_eq!(h[0], GenreCount { label: "Hip hop".into(), count: 2 });
        assert_eq!(h[1], GenreCount { label: "Indie rock".into(), count: 1 });
    }

    #[test]
    fn test_no_genres() {
        assert!(histogram(&[]).is_empty());
        assert!(histogram(&[artist("A", &[])]).is_empty());
    }

    #[test]
    fn test_capitalize_non_ascii() {
        assert_eq!(capitalize("éLECTRO"), "Électro");
        assert_eq!(capitalize(""), "");
    }
}
