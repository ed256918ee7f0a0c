use clap::{Parser, Subcommand};
use dual_map::{
    annotation::{DrawEvent, ShapeKind},
    config::MapConfig,
    dataset::GeoDataset,
    geodesy::{area, distance, format_area, format_distance, perimeter},
    scale::ScaleTable,
    sync::SyncState,
    viewport::{LatLng, MapViewport, Side},
    MapSession,
};
use log::debug;

fn parse_lat_lng(s: &str) -> Result<LatLng, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("expected lat,lon but got {}", s));
    }
    let lat: f64 = parts[0].trim().parse().map_err(|e| format!("{}: {}", s, e))?;
    let lon: f64 = parts[1].trim().parse().map_err(|e| format!("{}: {}", s, e))?;
    let point = LatLng::new(lat, lon);
    if !point.is_finite() {
        return Err(format!("coordinates must be finite: {}", s));
    }
    Ok(point)
}

fn parse_zoom(s: &str) -> Result<f64, String> {
    let zoom: f64 = s.trim().parse().map_err(|e| format!("{}: {}", s, e))?;
    if !zoom.is_finite() {
        return Err(format!("zoom must be finite: {}", s));
    }
    Ok(zoom)
}

fn read_dataset(path: &str) -> Result<GeoDataset, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("Error reading {}: {}", path, e))?;
    contents
        .parse()
        .map_err(|e| format!("Error parsing {}: {}", path, e))
}

fn load_config(path: Option<&str>) -> Result<MapConfig, String> {
    match path {
        Some(p) => MapConfig::load(p).map_err(|e| format!("Error loading config {}: {}", p, e)),
        None => Ok(MapConfig::default()),
    }
}

fn print_state(state: &SyncState) {
    println!("Syncing: {}", state.syncing);
    if let Some(center) = state.center {
        println!("Center: {}", center);
    }
    if let Some(zoom) = state.zoom {
        println!("Zoom: {:.2}", zoom);
    }
}

/// Converts a GeoJSON geometry into something the draw tool could have produced.
fn shape_of(geometry: &dual_map::dataset::Geometry) -> Option<(ShapeKind, Vec<LatLng>)> {
    use dual_map::dataset::Value;
    let to_lat_lng = |p: &Vec<f64>| LatLng::new(p[1], p[0]);
    match &geometry.value {
        Value::Point(p) if p.len() >= 2 => Some((ShapeKind::Point, vec![to_lat_lng(p)])),
        Value::LineString(line) => Some((
            ShapeKind::LineString,
            line.iter().filter(|p| p.len() >= 2).map(to_lat_lng).collect(),
        )),
        Value::Polygon(rings) => rings.first().map(|ring| {
            (
                ShapeKind::Polygon,
                ring.iter().filter(|p| p.len() >= 2).map(to_lat_lng).collect(),
            )
        }),
        _ => None,
    }
}

/// Command line front end for the dual map core.
#[derive(Parser)]
#[command(name = "dual_map_cli", version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the length of a path of lat,lon points.
    Distance {
        #[arg(required = true, allow_hyphen_values = true, value_parser = parse_lat_lng)]
        points: Vec<LatLng>,
    },
    /// Measure the area and perimeter of a ring of lat,lon points.
    Area {
        #[arg(required = true, allow_hyphen_values = true, value_parser = parse_lat_lng)]
        points: Vec<LatLng>,
    },
    /// Print the zoom level configured for a scale label.
    ScaleZoom { label: String },
    /// Print the scale label closest to a zoom level.
    ZoomLabel {
        #[arg(value_parser = parse_zoom)]
        zoom: f64,
    },
    /// List the configured scale table.
    Scales,
    /// Load a GeoJSON dataset into both viewports and print the resulting view.
    Load { path: String },
    /// Measure every feature of a GeoJSON file.
    Measure { path: String },
    /// Move one viewport and print both cameras after synchronization.
    Pan {
        #[arg(allow_hyphen_values = true, value_parser = parse_lat_lng)]
        center: LatLng,
        #[arg(value_parser = parse_zoom)]
        zoom: f64,
        /// Move the secondary viewport instead of the primary one
        #[arg(long)]
        secondary: bool,
        /// Turn synchronization off before moving
        #[arg(long)]
        no_sync: bool,
    },
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Distance { points } => {
            println!("Distance: {}", format_distance(distance(&points)));
        }
        Commands::Area { points } => {
            println!("Area: {}", format_area(area(&points)));
            println!("Perimeter: {}", format_distance(perimeter(&points)));
        }
        Commands::ScaleZoom { label } => {
            let table: ScaleTable = config.scale_table().map_err(|e| e.to_string())?;
            let zoom = table.zoom_for_scale(&label).map_err(|e| e.to_string())?;
            println!("Zoom for {} is {}", label, zoom);
        }
        Commands::ZoomLabel { zoom } => {
            let table = config.scale_table().map_err(|e| e.to_string())?;
            println!("Scale for zoom {} is {}", zoom, table.label_for_zoom(zoom));
        }
        Commands::Scales => {
            let table = config.scale_table().map_err(|e| e.to_string())?;
            for entry in table.entries() {
                println!("{} -> {}", entry.label, entry.zoom);
            }
        }
        Commands::Load { path } => {
            let dataset = read_dataset(&path)?;
            let mut session = MapSession::in_memory(config).map_err(|e| e.to_string())?;
            if !session.load_dataset(&dataset) {
                return Err(format!("Error loading {}", path));
            }
            println!("Loaded {} features", dataset.len());
            print_state(&session.sync_state());
        }
        Commands::Measure { path } => {
            let dataset = read_dataset(&path)?;
            let mut session = MapSession::in_memory(config).map_err(|e| e.to_string())?;
            for (idx, feature) in dataset.features().iter().enumerate() {
                let name = feature
                    .property("name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("feature {}", idx + 1));
                let Some((kind, vertices)) = feature.geometry.as_ref().and_then(shape_of) else {
                    println!("{}: unsupported geometry", name);
                    continue;
                };
                let id = session.handle_draw(Side::Primary, DrawEvent::Created { kind, vertices });
                let label = id
                    .and_then(|id| session.annotations(Side::Primary).get(id))
                    .and_then(|s| s.label.clone());
                match label {
                    Some(label) => println!("{}: {}", name, label.replace('\n', ", ")),
                    None => println!("{}: no measurement", name),
                }
            }
        }
        Commands::Pan {
            center,
            zoom,
            secondary,
            no_sync,
        } => {
            let mut session = MapSession::in_memory(config).map_err(|e| e.to_string())?;
            if no_sync && session.sync_state().syncing {
                session.toggle_sync();
            }
            let side = if secondary { Side::Secondary } else { Side::Primary };
            if let Some(vp) = session.viewport_mut(side) {
                vp.pan_to(center);
                vp.zoom_to(zoom);
            }
            let writes = session.dispatch();
            debug!("{} corrective writes", writes);
            for side in [Side::Primary, Side::Secondary] {
                if let Some(vp) = session.viewport(side) {
                    println!("{}: {} z{:.2}", side, vp.center(), vp.zoom());
                }
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
