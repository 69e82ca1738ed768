//! Marks up glossary terms inside free text.
//!
//! [`annotate`] splits a text into [`Segment`]s: runs of plain text and
//! occurrences of glossary terms paired with their definitions, in the
//! order they appear. Joining the segments’ text gives back the input
//! exactly, so a renderer can show every character while making the
//! terms interactive.

use serde::Serialize;

use crate::event::GlossaryTerm;

/// A piece of annotated text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment<'a> {
    /// Text with no glossary term in it.
    Plain { text: &'a str },

    /// An occurrence of a glossary term, as written in the source text.
    Term { text: &'a str, definition: &'a str },
}

impl<'a> Segment<'a> {
    /// The source text covered by this segment.
    pub fn text(&self) -> &'a str {
        match *self {
            Segment::Plain { text } | Segment::Term { text, .. } => text,
        }
    }
}

/// Splits `text` into plain and annotated segments using `glossary`.
///
/// Matching ignores case. Where several terms could start at the same
/// position the one with the most characters wins, and matches never
/// overlap. Terms that are empty strings are ignored. With no usable
/// terms the whole text comes back as a single plain segment.
///
/// ```
/// use chronos::event::GlossaryTerm;
/// use chronos::glossary::{annotate, Segment};
///
/// let glossary = vec![GlossaryTerm::new("apolo", "Programa espacial de la NASA.")];
/// let segments: Vec<_> = annotate("El Apolo 11", &glossary).collect();
///
/// assert_eq!(segments, vec![
///     Segment::Plain { text: "El " },
///     Segment::Term { text: "Apolo", definition: "Programa espacial de la NASA." },
///     Segment::Plain { text: " 11" },
/// ]);
/// ```
pub fn annotate<'a>(text: &'a str, glossary: &'a [GlossaryTerm]) -> Annotations<'a> {
    let mut terms: Vec<(&'a GlossaryTerm, usize)> = glossary
        .iter()
        .filter(|entry| !entry.term.is_empty())
        .map(|entry| (entry, entry.term.chars().count()))
        .collect();

    // stable, so equally long terms keep their glossary order
    terms.sort_by(|(_, a), (_, b)| b.cmp(a));

    let terms: Vec<&'a GlossaryTerm> = terms.into_iter().map(|(entry, _)| entry).collect();

    if terms.is_empty() {
        return Annotations {
            text,
            terms,
            position: text.len(),
            pending: Some(Segment::Plain { text }),
        };
    }

    Annotations {
        text,
        terms,
        position: 0,
        pending: None,
    }
}

/// The lazy sequence of segments returned by [`annotate`].
#[derive(Clone, Debug)]
pub struct Annotations<'a> {
    text: &'a str,
    terms: Vec<&'a GlossaryTerm>,
    position: usize,
    pending: Option<Segment<'a>>,
}

impl<'a> Annotations<'a> {
    /// Returns the longest term matching at the start of `rest` and the
    /// length in bytes of the text it covers.
    fn longest_match(&self, rest: &'a str) -> Option<(&'a GlossaryTerm, usize)> {
        self.terms
            .iter()
            .find_map(|entry| match_prefix(rest, &entry.term).map(|len| (*entry, len)))
    }
}

impl<'a> Iterator for Annotations<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(segment) = self.pending.take() {
            return Some(segment);
        }

        let text = self.text;
        let rest = &text[self.position..];

        if rest.is_empty() {
            return None;
        }

        for (offset, _) in rest.char_indices() {
            if let Some((entry, len)) = self.longest_match(&rest[offset..]) {
                let start = self.position + offset;
                let end = start + len;

                let term = Segment::Term {
                    text: &text[start..end],
                    definition: &entry.definition,
                };

                self.position = end;

                if offset == 0 {
                    return Some(term);
                }

                self.pending = Some(term);

                return Some(Segment::Plain {
                    text: &rest[..offset],
                });
            }
        }

        self.position = text.len();

        Some(Segment::Plain { text: rest })
    }
}

/// Returns the byte length of the prefix of `text` that matches `term`
/// ignoring case, if there is one.
fn match_prefix(text: &str, term: &str) -> Option<usize> {
    let mut chars = text.char_indices();

    for expected in term.chars() {
        let (_, actual) = chars.next()?;

        if !same_letter(actual, expected) {
            return None;
        }
    }

    Some(chars.next().map_or(text.len(), |(index, _)| index))
}

fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{annotate, Segment};
    use crate::event::GlossaryTerm;

    fn joined(segments: &[Segment]) -> String {
        segments.iter().map(Segment::text).collect()
    }

    fn terms(segments: &[Segment]) -> Vec<String> {
        segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Term { text, .. } => Some(text.to_string()),
                Segment::Plain { .. } => None,
            })
            .collect()
    }

    #[test]
    fn prefers_the_longest_term() {
        let glossary = vec![
            GlossaryTerm::new("Apolo", "Programa espacial."),
            GlossaryTerm::new("Apolo 11", "Primera misión tripulada en alunizar."),
        ];

        let segments: Vec<_> = annotate("Apolo 11 fue lanzada en 1969.", &glossary).collect();

        assert_eq!(
            segments,
            vec![
                Segment::Term {
                    text: "Apolo 11",
                    definition: "Primera misión tripulada en alunizar."
                },
                Segment::Plain {
                    text: " fue lanzada en 1969."
                },
            ]
        );
    }

    #[test]
    fn keeps_the_source_casing() {
        let glossary = vec![GlossaryTerm::new("neil armstrong", "Astronauta.")];

        let segments: Vec<_> =
            annotate("Neil Armstrong descendió lentamente.", &glossary).collect();

        assert_eq!(terms(&segments), vec!["Neil Armstrong"]);
        assert_eq!(segments[0].text(), "Neil Armstrong");
    }

    #[test]
    fn empty_glossary_passes_text_through() {
        let segments: Vec<_> = annotate("Cae el Muro de Berlín.", &[]).collect();

        assert_eq!(
            segments,
            vec![Segment::Plain {
                text: "Cae el Muro de Berlín."
            }]
        );
    }

    #[test]
    fn empty_terms_are_ignored() {
        let glossary = vec![GlossaryTerm::new("", "Nada.")];

        let segments: Vec<_> = annotate("Kitty Hawk", &glossary).collect();

        assert_eq!(segments, vec![Segment::Plain { text: "Kitty Hawk" }]);
    }

    #[test]
    fn finds_every_occurrence_without_overlap() {
        let glossary = vec![
            GlossaryTerm::new("RDA", "República Democrática Alemana."),
            GlossaryTerm::new("ADA", "Otra cosa."),
        ];

        let text = "La rda y la RDA; RDADA.";
        let segments: Vec<_> = annotate(text, &glossary).collect();

        assert_eq!(terms(&segments), vec!["rda", "RDA", "RDA"]);
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn terms_at_both_ends() {
        let glossary = vec![GlossaryTerm::new("reloj digital", "Un reloj.")];

        let segments: Vec<_> = annotate("Reloj digital contra reloj digital", &glossary).collect();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1], Segment::Plain { text: " contra " });
        assert_eq!(terms(&segments), vec!["Reloj digital", "reloj digital"]);
    }

    #[test]
    fn matches_accented_letters_in_any_case() {
        let glossary = vec![GlossaryTerm::new("telón de acero", "Frontera.")];

        let segments: Vec<_> = annotate("El TELÓN DE ACERO cayó.", &glossary).collect();

        assert_eq!(terms(&segments), vec!["TELÓN DE ACERO"]);
    }

    #[test]
    fn empty_text_with_glossary_has_no_segments() {
        let glossary = vec![GlossaryTerm::new("Apolo", "Programa espacial.")];

        assert_eq!(annotate("", &glossary).count(), 0);
    }

    proptest! {
        #[test]
        fn segments_reconstruct_the_text(
            text in "[aAbBñÑİi ]{0,40}|\\PC{0,40}",
            glossary in proptest::collection::vec(("[aAbBñÑİi ]{0,5}|\\PC{0,5}", "\\PC{0,10}"), 0..5),
        ) {
            let glossary: Vec<GlossaryTerm> = glossary
                .into_iter()
                .map(|(term, definition)| GlossaryTerm::new(term, definition))
                .collect();

            let segments: Vec<_> = annotate(&text, &glossary).collect();

            prop_assert_eq!(joined(&segments), text.clone());

            for segment in &segments {
                if let Segment::Plain { text: plain } = segment {
                    prop_assert!(!plain.is_empty() || text.is_empty(), "plain segments are never empty");
                }
            }
        }
    }
}
