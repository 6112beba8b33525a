//! MusicXML reader: `score-partwise` documents into score records
//!
//! Only the first part is read. Divisions and key come from the first
//! `<attributes>` that carries them.

use std::str::FromStr;

use roxmltree::{Document, Node, ParsingOptions};

use crate::score::{
    DegreeType, ScoreBarline, ScoreDegree, ScoreError, ScoreHarmony, ScoreKey, ScoreKind,
    ScoreMeasure, ScoreNote, ScorePitch, ScoreWork,
};

impl ScoreWork {
    pub fn from_musicxml(xml: &str) -> Result<Self, ScoreError> {
        // exported files carry a DOCTYPE
        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let doc = Document::parse_with_options(xml, options)?;

        let score = doc.root_element();
        if !score.has_tag_name("score-partwise") {
            return Err(ScoreError::Malformed(format!(
                "expected <score-partwise>, found <{}>",
                score.tag_name().name()
            )));
        }
        let part = child(score, "part").ok_or_else(|| missing("part"))?;

        let mut work = ScoreWork {
            title: child(score, "work")
                .and_then(|w| child_text(w, "work-title"))
                .or_else(|| child_text(score, "movement-title"))
                .map(str::to_string),
            composer: child(score, "identification")
                .and_then(|id| {
                    id.children()
                        .find(|c| c.has_tag_name("creator") && c.attribute("type") == Some("composer"))
                })
                .and_then(|c| c.text())
                .map(|t| t.trim().to_string()),
            ..ScoreWork::default()
        };

        for measure in part.children().filter(|n| n.has_tag_name("measure")) {
            for attributes in measure.children().filter(|n| n.has_tag_name("attributes")) {
                if work.divisions.is_none() {
                    work.divisions = field::<f64>(attributes, "divisions")?.map(|d| d.round() as u32);
                }
                if work.key.is_none() {
                    work.key = child(attributes, "key").map(read_key).transpose()?;
                }
            }
            work.measures.push(read_measure(measure)?);
        }

        tracing::debug!(
            "Read {} measures from MusicXML '{}'",
            work.measures.len(),
            work.title.as_deref().unwrap_or("untitled")
        );
        Ok(work)
    }
}

fn missing(tag: &str) -> ScoreError {
    ScoreError::Malformed(format!("missing <{}>", tag))
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(tag))
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child(node, tag).and_then(|c| c.text()).map(str::trim)
}

/// Parse the text of child `tag`, if present
fn field<T: FromStr>(node: Node, tag: &str) -> Result<Option<T>, ScoreError> {
    child_text(node, tag)
        .map(|text| {
            text.parse::<T>()
                .map_err(|_| ScoreError::Malformed(format!("<{}> is not a number: {}", tag, text)))
        })
        .transpose()
}

/// Alterations are decimal semitones; microtones round to the nearest one
fn alter(node: Node, tag: &str) -> Result<i8, ScoreError> {
    Ok(field::<f64>(node, tag)?.map_or(0, |a| a.round() as i8))
}

fn read_pitch(node: Node, prefix: &str) -> Result<ScorePitch, ScoreError> {
    let step_tag = format!("{}-step", prefix);
    let step = child_text(node, &step_tag).ok_or_else(|| missing(&step_tag))?;
    Ok(ScorePitch {
        step: step.to_string(),
        alter: alter(node, &format!("{}-alter", prefix))?,
    })
}

fn read_key(node: Node) -> Result<ScoreKey, ScoreError> {
    Ok(ScoreKey {
        fifths: field::<i8>(node, "fifths")?.ok_or_else(|| missing("fifths"))?,
        mode: child_text(node, "mode").map(str::to_string),
    })
}

fn read_degree(node: Node) -> Result<ScoreDegree, ScoreError> {
    let degree_type = match child_text(node, "degree-type") {
        Some("add") => DegreeType::Add,
        Some("alter") => DegreeType::Alter,
        Some("subtract") => DegreeType::Subtract,
        Some(other) => return Err(ScoreError::Malformed(format!("unknown degree-type {}", other))),
        None => return Err(missing("degree-type")),
    };
    Ok(ScoreDegree {
        value: field::<u8>(node, "degree-value")?.ok_or_else(|| missing("degree-value"))?,
        alter: alter(node, "degree-alter")?,
        degree_type,
    })
}

fn read_harmony(node: Node) -> Result<ScoreHarmony, ScoreError> {
    let root = child(node, "root").ok_or_else(|| missing("root"))?;
    let kind = child(node, "kind").ok_or_else(|| missing("kind"))?;
    Ok(ScoreHarmony {
        root: read_pitch(root, "root")?,
        kind: ScoreKind {
            value: kind.text().unwrap_or_default().trim().to_string(),
            text: kind.attribute("text").map(str::to_string),
        },
        degrees: node
            .children()
            .filter(|n| n.has_tag_name("degree"))
            .map(read_degree)
            .collect::<Result<_, _>>()?,
        bass: child(node, "bass").map(|b| read_pitch(b, "bass")).transpose()?,
    })
}

fn read_measure(node: Node) -> Result<ScoreMeasure, ScoreError> {
    let harmonies = node
        .children()
        .filter(|n| n.has_tag_name("harmony"))
        .map(read_harmony)
        .collect::<Result<Vec<_>, _>>()?;

    // grace notes have no duration
    let mut notes = Vec::new();
    for note in node.children().filter(|n| n.has_tag_name("note")) {
        if let Some(duration) = field::<f64>(note, "duration")? {
            notes.push(ScoreNote {
                duration: duration.round() as u32,
            });
        }
    }

    let barline = child(node, "barline").map(|b| ScoreBarline {
        location: b.attribute("location").unwrap_or("right").to_string(),
        style: child_text(b, "bar-style").unwrap_or_default().to_string(),
    });

    Ok(ScoreMeasure {
        harmonies,
        notes,
        barline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ingest;

    const LEAD_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise version="4.0">
  <work><work-title>Blue Room</work-title></work>
  <identification>
    <creator type="lyricist">Someone Else</creator>
    <creator type="composer">A. Writer</creator>
  </identification>
  <part-list><score-part id="P1"><part-name>Lead</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>768</divisions>
        <key><fifths>-1</fifths><mode>major</mode></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
      </attributes>
      <harmony>
        <root><root-step>D</root-step></root>
        <kind text="m7">minor-seventh</kind>
      </harmony>
      <note><pitch><step>D</step><octave>4</octave></pitch><duration>1536</duration></note>
      <harmony>
        <root><root-step>G</root-step></root>
        <kind>dominant</kind>
        <degree><degree-value>9</degree-value><degree-alter>-1</degree-alter><degree-type>add</degree-type></degree>
      </harmony>
      <note><pitch><step>B</step><octave>4</octave></pitch><duration>1536</duration></note>
    </measure>
    <measure number="2">
      <note><rest/><duration>3072</duration></note>
    </measure>
    <measure number="3">
      <barline location="left"><bar-style>light-light</bar-style></barline>
      <harmony>
        <root><root-step>B</root-step><root-alter>-1</root-alter></root>
        <kind>dominant</kind>
        <degree><degree-value>5</degree-value><degree-alter>-1</degree-alter><degree-type>alter</degree-type></degree>
        <bass><bass-step>F</bass-step></bass>
      </harmony>
      <note><grace/><pitch><step>C</step><octave>5</octave></pitch></note>
      <note><pitch><step>B</step><alter>-1</alter><octave>4</octave></pitch><duration>3072</duration></note>
    </measure>
  </part>
</score-partwise>
"#;

    #[test]
    fn test_reads_lead_sheet() {
        let work = ScoreWork::from_musicxml(LEAD_SHEET).unwrap();
        assert_eq!(work.title.as_deref(), Some("Blue Room"));
        assert_eq!(work.composer.as_deref(), Some("A. Writer"));
        assert_eq!(work.divisions, Some(768));
        assert_eq!(work.key, Some(ScoreKey { fifths: -1, mode: Some("major".to_string()) }));
        assert_eq!(work.measures.len(), 3);

        let first = &work.measures[0];
        assert_eq!(first.harmonies.len(), 2);
        assert_eq!(first.harmonies[0].kind.text.as_deref(), Some("m7"));
        assert_eq!(first.harmonies[1].degrees[0].degree_type, DegreeType::Add);
        assert!(work.measures[1].harmonies.is_empty());

        let last = &work.measures[2];
        assert_eq!(last.harmonies[0].root.alter, -1);
        assert_eq!(last.harmonies[0].bass.as_ref().unwrap().step, "F");
        // the grace note is skipped
        assert_eq!(last.notes.len(), 1);
        assert_eq!(last.barline.as_ref().unwrap().style, "light-light");
    }

    #[test]
    fn test_lead_sheet_ingests_into_parts() {
        let parts = ingest(&ScoreWork::from_musicxml(LEAD_SHEET).unwrap()).unwrap();
        assert_eq!(parts.len(), 2);

        assert_eq!(parts[0].title, "Blue Room | A. Writer | Part 1");
        assert_eq!(parts[0].key.to_string(), "F");
        assert_eq!(parts[0].symbols().collect::<Vec<_>>(), vec!["Dm7", "G7(b9)"]);
        assert_eq!(parts[0].changes[1].start, 2.0);
        assert_eq!(parts[0].length, 8.0);

        assert_eq!(parts[1].title, "Blue Room | A. Writer | Part 2");
        assert_eq!(parts[1].symbols().collect::<Vec<_>>(), vec!["Bb7(b5)/F"]);
        assert_eq!(parts[1].length, 4.0);
    }

    #[test]
    fn test_minor_key_and_missing_metadata() {
        let xml = r#"<score-partwise>
  <movement-title>Untitled Waltz</movement-title>
  <part id="P1">
    <measure number="1">
      <attributes><key><fifths>0</fifths><mode>minor</mode></key></attributes>
      <harmony><root><root-step>A</root-step></root><kind>minor</kind></harmony>
    </measure>
  </part>
</score-partwise>"#;
        let work = ScoreWork::from_musicxml(xml).unwrap();
        assert_eq!(work.title.as_deref(), Some("Untitled Waltz"));
        assert_eq!(work.composer, None);
        assert_eq!(work.divisions, None);

        let parts = ingest(&work).unwrap();
        assert_eq!(parts[0].title, "Untitled Waltz | Unknown Composer | Part 1");
        assert_eq!(parts[0].key.to_string(), "Am");
        assert_eq!(parts[0].changes[0].duration, 4.0);
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            ScoreWork::from_musicxml("<score-partwise><part>"),
            Err(ScoreError::Xml(_))
        ));
        assert!(matches!(
            ScoreWork::from_musicxml("<score-timewise/>"),
            Err(ScoreError::Malformed(_))
        ));
        let bad_divisions = r#"<score-partwise><part id="P1"><measure>
            <attributes><divisions>lots</divisions></attributes>
        </measure></part></score-partwise>"#;
        assert!(matches!(
            ScoreWork::from_musicxml(bad_divisions),
            Err(ScoreError::Malformed(_))
        ));
        let rootless = r#"<score-partwise><part id="P1"><measure>
            <harmony><kind>major</kind></harmony>
        </measure></part></score-partwise>"#;
        assert!(matches!(
            ScoreWork::from_musicxml(rootless),
            Err(ScoreError::Malformed(_))
        ));
    }
}
