//! Map surface binding
//!
//! The surface is the only place the user interacts with points. Here that
//! means terminal commands that become [`SessionEvent`]s, plus a Leaflet page
//! of the catalog markers so the user can see where each id is.

use std::fmt::Write as _;
use std::path::Path;

use log::info;

use crate::core::catalog::AirportCatalog;
use crate::core::error::Result;
use crate::core::session::SessionEvent;

/// One parsed line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    /// Forward to the session
    Event(SessionEvent),
    /// Print the catalog
    List,
    Help,
    Quit,
    /// Blank line
    Nothing,
}

pub const HELP_TEXT: &str = "\
Commands:
  <id> | <name>        pick an airport (first pick is the source)
  pick <id|name>       same as above
  reset                clear the selection and start over
  status               show the current selection
  list                 list all airports
  help                 show this help
  quit                 exit";

/// Parse one line of terminal input
pub fn parse_command(line: &str) -> std::result::Result<SurfaceCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(SurfaceCommand::Nothing);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "pick" | "select" => {
            if rest.is_empty() {
                Err("usage: pick <id|name>".to_string())
            } else {
                Ok(SurfaceCommand::Event(activation(rest)))
            }
        }
        "reset" | "restart" if rest.is_empty() => Ok(SurfaceCommand::Event(SessionEvent::Reset)),
        "status" if rest.is_empty() => Ok(SurfaceCommand::Event(SessionEvent::Status)),
        "list" | "ls" if rest.is_empty() => Ok(SurfaceCommand::List),
        "help" | "?" if rest.is_empty() => Ok(SurfaceCommand::Help),
        "quit" | "exit" | "q" if rest.is_empty() => Ok(SurfaceCommand::Quit),
        _ => Ok(SurfaceCommand::Event(activation(line))),
    }
}

fn activation(token: &str) -> SessionEvent {
    match token.parse::<u32>() {
        Ok(id) => SessionEvent::Activate(id),
        Err(_) => SessionEvent::ActivateByName(token.to_string()),
    }
}

/// Plain-text table of the catalog
pub fn format_catalog(catalog: &AirportCatalog) -> String {
    let width = catalog
        .points()
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<width$}  {:>9}  {:>9}", "id", "name", "lat", "lon");
    for p in catalog.points() {
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>9.4}  {:>9.4}",
            p.id, p.name, p.latitude, p.longitude
        );
    }
    out
}

/// Standalone Leaflet page with one marker per airport; popups show `id: name`
pub fn render_leaflet_map(catalog: &AirportCatalog) -> Result<String> {
    let n = catalog.len().max(1) as f64;
    let center_lat = catalog.points().iter().map(|p| p.latitude).sum::<f64>() / n;
    let center_lon = catalog.points().iter().map(|p| p.longitude).sum::<f64>() / n;

    // `<` escaped so a name can never close the script element
    let data = serde_json::to_string(catalog.points())?.replace('<', "\\u003c");

    Ok(format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Airports Map</title>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <link rel="stylesheet" href="https://unpkg.com/leaflet/dist/leaflet.css" />
  <style>
    #mapid {{ height: 90vh; width: 100%; }}
    body {{ margin: 0; padding: 0; font-family: Arial, sans-serif; }}
    .topbar {{ padding: 8px; background: #f8f9fa; border-bottom: 1px solid #ddd; }}
  </style>
</head>
<body>
  <div class="topbar">
    <strong>Airports Map</strong>: click a marker to see its <em>id: name</em>, then type the id or name in the terminal.
  </div>
  <div id="mapid"></div>
  <script src="https://unpkg.com/leaflet/dist/leaflet.js"></script>
  <script>
    var airports = {data};
    var map = L.map('mapid').setView([{center_lat:.4}, {center_lon:.4}], 5);
    L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
        maxZoom: 18,
        attribution: '&copy; OpenStreetMap contributors'
    }}).addTo(map);
    airports.forEach(function (a) {{
        var label = document.createElement('span');
        label.textContent = a.id + ': ' + a.name;
        L.marker([a.lat, a.lon]).addTo(map).bindPopup(label);
    }});
    var info = L.control({{position: 'topright'}});
    info.onAdd = function () {{
        var div = L.DomUtil.create('div', 'info');
        div.innerHTML = '<b>' + airports.length + ' airports</b><br>IDs shown in popups';
        div.style.background = 'white';
        div.style.padding = '6px';
        div.style.border = '1px solid #ccc';
        return div;
    }};
    info.addTo(map);
  </script>
</body>
</html>
"#
    ))
}

/// Write the Leaflet page to disk
pub fn write_leaflet_map(catalog: &AirportCatalog, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_leaflet_map(catalog)?)?;
    info!("Map written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Point;

    #[test]
    fn test_parse_picks() {
        assert_eq!(
            parse_command("3").unwrap(),
            SurfaceCommand::Event(SessionEvent::Activate(3))
        );
        assert_eq!(
            parse_command("pick 11").unwrap(),
            SurfaceCommand::Event(SessionEvent::Activate(11))
        );
        assert_eq!(
            parse_command("Pick  Thiruvananthapuram ").unwrap(),
            SurfaceCommand::Event(SessionEvent::ActivateByName("Thiruvananthapuram".into()))
        );
        assert_eq!(
            parse_command("Mumbai").unwrap(),
            SurfaceCommand::Event(SessionEvent::ActivateByName("Mumbai".into()))
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_command("reset").unwrap(), SurfaceCommand::Event(SessionEvent::Reset));
        assert_eq!(parse_command("STATUS").unwrap(), SurfaceCommand::Event(SessionEvent::Status));
        assert_eq!(parse_command("list").unwrap(), SurfaceCommand::List);
        assert_eq!(parse_command("?").unwrap(), SurfaceCommand::Help);
        assert_eq!(parse_command("quit").unwrap(), SurfaceCommand::Quit);
        assert_eq!(parse_command("   ").unwrap(), SurfaceCommand::Nothing);
        assert!(parse_command("pick").is_err());
    }

    #[test]
    fn test_multi_word_name_is_not_a_keyword() {
        assert_eq!(
            parse_command("New Delhi").unwrap(),
            SurfaceCommand::Event(SessionEvent::ActivateByName("New Delhi".into()))
        );
    }

    #[test]
    fn test_format_catalog() {
        let text = format_catalog(&AirportCatalog::builtin());
        assert_eq!(text.lines().count(), 21);
        assert!(text.lines().nth(1).unwrap().contains("Mumbai"));
    }

    #[test]
    fn test_leaflet_map_contains_markers() {
        let html = render_leaflet_map(&AirportCatalog::builtin()).unwrap();
        assert!(html.contains("L.map('mapid')"));
        assert!(html.contains(r#""name":"Srinagar""#));
        assert!(html.contains("{s}.tile.openstreetmap.org"));
    }

    #[test]
    fn test_leaflet_map_escapes_script_breakout() {
        let catalog = AirportCatalog::from_points(vec![Point::new(
            1,
            "</script><b>x",
            1.0,
            2.0,
        )])
        .unwrap();
        let html = render_leaflet_map(&catalog).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("\\u003c/script>"));
    }

    #[test]
    fn test_write_leaflet_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airports_map.html");
        write_leaflet_map(&AirportCatalog::builtin(), &path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!doctype html>"));
    }
}
