//! Writers for finished urban areas and targeting tables.

use std::io::Write;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use geotargeting_spatial::projection;
use geotargeting_urban_models::{FinishReason, TargetingRow, UrbanArea};

use crate::DatasetError;

/// Renders urban areas as a WGS84 `GeoJSON` `FeatureCollection`.
///
/// # Errors
///
/// Returns [`DatasetError::Json`] if a property fails to serialize.
pub fn urban_areas_to_geojson(areas: &[UrbanArea]) -> Result<String, DatasetError> {
    let mut features = Vec::with_capacity(areas.len());

    for area in areas {
        let polygon = projection::unproject(&area.geometry);

        let mut properties = JsonObject::new();
        properties.insert("name".into(), serde_json::to_value(&area.name)?);
        properties.insert("rad".into(), serde_json::to_value(area.rad)?);
        properties.insert("max_density".into(), serde_json::to_value(area.max_density)?);
        properties.insert("mean_density".into(), serde_json::to_value(area.mean_density)?);
        properties.insert(
            "overlap_population".into(),
            serde_json::to_value(area.overlap_population)?,
        );
        properties.insert("round".into(), serde_json::to_value(area.round)?);
        properties.insert(
            "finish_reason".into(),
            serde_json::to_value(match area.reason {
                FinishReason::Density => "density",
                FinishReason::RoundCap => "round_cap",
            })?,
        );

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    Ok(GeoJson::FeatureCollection(collection).to_string())
}

/// Writes urban areas to a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`DatasetError`] if serialization or the write fails.
pub fn write_urban_areas(path: &Path, areas: &[UrbanArea]) -> Result<(), DatasetError> {
    let text = urban_areas_to_geojson(areas)?;
    std::fs::write(path, text).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("Wrote {} urban areas to {}", areas.len(), path.display());
    Ok(())
}

/// Writes targeting rows as CSV with a
/// `region,name,total_population,rad,lat,lng` header.
///
/// # Errors
///
/// Returns [`DatasetError::Csv`] if a row fails to serialize or the
/// writer fails.
pub fn write_rows_to<W: Write>(writer: W, rows: &[TargetingRow]) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes targeting rows to a CSV file.
///
/// An empty table still gets a header row.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be created or written.
pub fn write_rows(path: &Path, rows: &[TargetingRow]) -> Result<(), DatasetError> {
    let file = std::fs::File::create(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    if rows.is_empty() {
        let mut csv_writer = csv::Writer::from_writer(file);
        csv_writer.write_record(["region", "name", "total_population", "rad", "lat", "lng"])?;
        csv_writer.flush().map_err(csv::Error::from)?;
    } else {
        write_rows_to(file, rows)?;
    }

    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, polygon};

    fn row(region: &str, name: &str) -> TargetingRow {
        TargetingRow {
            region: region.to_string(),
            name: name.to_string(),
            total_population: 12_345,
            rad: 3.0,
            lat: -1.5,
            lng: 36.25,
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_rows_to(&mut buf, &[row("Nairobi", "Nairobi"), row("Kiambu", "Thika")])
            .expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "region,name,total_population,rad,lat,lng");
        assert_eq!(lines[1], "Nairobi,Nairobi,12345,3.0,-1.5,36.25");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn geojson_is_unprojected_with_properties() {
        let area = UrbanArea {
            name: "Somewhere".to_string(),
            location: Point::new(0.0, 0.0),
            geometry: polygon![
                (x: 0.0, y: 0.0),
                (x: 1000.0, y: 0.0),
                (x: 1000.0, y: 1000.0),
                (x: 0.0, y: 0.0),
            ],
            rad: 1.0,
            max_density: 10.0,
            mean_density: 5.0,
            overlap_population: 42,
            round: 0,
            reason: FinishReason::Density,
        };

        let text = urban_areas_to_geojson(&[area]).expect("render");
        let parsed: GeoJson = text.parse().expect("valid geojson");
        let GeoJson::FeatureCollection(fc) = parsed else {
            panic!("expected a FeatureCollection");
        };
        let feature = &fc.features[0];
        assert_eq!(
            feature.property("overlap_population"),
            Some(&serde_json::json!(42))
        );
        assert_eq!(
            feature.property("finish_reason"),
            Some(&serde_json::json!("density"))
        );

        let geometry: geo::Geometry<f64> = feature
            .geometry
            .clone()
            .expect("geometry")
            .try_into()
            .expect("convert");
        let geo::Geometry::Polygon(polygon) = geometry else {
            panic!("expected a polygon");
        };
        // 1000 m east of the origin is ~0.009 degrees.
        let x = polygon.exterior().0[1].x;
        assert!((x - 0.008_983_152_841_195_214).abs() < 1e-12, "x was {x}");
    }
}
