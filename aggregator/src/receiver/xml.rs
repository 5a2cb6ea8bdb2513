use dfcore::receiver::{ReceiverSnapshot, TelemetryError};
use roxmltree::{Document, Node};
use std::str::FromStr;

/// Parses a receiver's DOA report document into a snapshot.
///
/// Fields are read from direct children of the root element, with the station
/// position nested under `LOCATION`. `TIME` and `CONF` accept a decimal
/// fraction, which is truncated.
pub fn parse_snapshot(endpoint: &str, body: &str) -> Result<ReceiverSnapshot, TelemetryError> {
    let document = Document::parse(body).map_err(|err| TelemetryError::Malformed {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    let report = Report {
        endpoint,
        root: document.root_element(),
    };

    let confidence = report.integer(&["CONF"], "CONF")?;
    let confidence = i32::try_from(confidence)
        .map_err(|err| report.malformed("CONF", &confidence.to_string(), err))?;

    Ok(ReceiverSnapshot::new(
        report.text(&["STATION_ID"], "STATION_ID")?,
        report.integer(&["TIME"], "TIME")?,
        report.number(&["FREQUENCY"], "FREQUENCY")?,
        report.number(&["LOCATION", "LATITUDE"], "LOCATION/LATITUDE")?,
        report.number(&["LOCATION", "LONGITUDE"], "LOCATION/LONGITUDE")?,
        report.number(&["LOCATION", "HEADING"], "LOCATION/HEADING")?,
        report.number(&["DOA"], "DOA")?,
        report.number(&["PWR"], "PWR")?,
        confidence,
    ))
}

struct Report<'a, 'input> {
    endpoint: &'a str,
    root: Node<'a, 'input>,
}

impl<'a, 'input> Report<'a, 'input> {
    fn find(&self, path: &[&str]) -> Option<Node<'a, 'input>> {
        path.iter().try_fold(self.root, |node, tag| {
            node.children()
                .find(|child| child.is_element() && child.has_tag_name(*tag))
        })
    }

    fn text(&self, path: &[&str], field: &'static str) -> Result<String, TelemetryError> {
        self.find(path)
            .and_then(|node| node.text())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TelemetryError::MissingField {
                endpoint: self.endpoint.to_string(),
                field,
            })
    }

    fn number(&self, path: &[&str], field: &'static str) -> Result<f64, TelemetryError> {
        let text = self.text(path, field)?;
        let value = f64::from_str(&text).map_err(|err| self.malformed(field, &text, err))?;
        if !value.is_finite() {
            return Err(TelemetryError::Malformed {
                endpoint: self.endpoint.to_string(),
                reason: format!("{} is not finite", field),
            });
        }
        Ok(value)
    }

    fn integer(&self, path: &[&str], field: &'static str) -> Result<i64, TelemetryError> {
        let text = self.text(path, field)?;
        match i64::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) => self.number(path, field).map(|value| value.trunc() as i64),
        }
    }

    fn malformed(&self, field: &str, text: &str, err: impl std::fmt::Display) -> TelemetryError {
        TelemetryError::Malformed {
            endpoint: self.endpoint.to_string(),
            reason: format!("{} {:?}: {}", field, text, err),
        }
    }
}
