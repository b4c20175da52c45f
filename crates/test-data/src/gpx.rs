//! GPX file generation from simulated fixes.
//!
//! Generates valid GPX 1.1 XML so simulated commutes can be replayed through
//! `commute::gpx_source::GpxReplaySource` or inspected in other tools.

use commute::Fix;

/// Generates a GPX 1.1 XML document with a single track segment.
pub fn generate_gpx(fixes: &[Fix], name: &str) -> Vec<u8> {
    let mut gpx = String::new();

    // GPX 1.1 header
    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="eco-commute-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1">"#);
    gpx.push('\n');

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(name)));
    gpx.push_str("    <trkseg>\n");

    for fix in fixes {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
            fix.coordinate.latitude, fix.coordinate.longitude
        ));
        gpx.push('\n');

        let formatted = fix
            .timestamp
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        gpx.push_str(&format!("        <time>{}</time>\n", formatted));

        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx.into_bytes()
}

/// Escapes XML special characters in a string.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
