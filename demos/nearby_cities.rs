use geoquery::prelude::*;
use geoquery::query::{Direction, FilterOp};
use serde_json::json;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== geoquery - Nearby Places Demo ===\n");

    let collection = GeoCollection::new(MemoryStore::new());

    // === 1. INDEXING DOCUMENTS ===
    println!("1. Indexing Documents");
    println!("---------------------");

    let places = [
        ("Deutsches Eck", 50.3644, 7.6063, "landmark"),
        ("Festung Ehrenbreitstein", 50.3653, 7.6147, "landmark"),
        ("Koblenz Hbf", 50.3510, 7.5886, "station"),
        ("Schloss Stolzenfels", 50.3032, 7.5934, "landmark"),
        ("Lahnstein", 50.3067, 7.6092, "town"),
        ("Rhens", 50.2813, 7.6194, "town"),
        ("Boppard", 50.2315, 7.5903, "town"),
    ];

    for (name, lat, lon, kind) in places {
        let point = GeoPoint::new(lat, lon)?;
        let mut doc = Document::from_value(
            name,
            json!({ "name": name, "kind": kind, "coordinates": [lat, lon] }),
        )?;
        let hash = collection.geohash_for(&point)?;
        println!("   {:<24} -> {}", name, hash);
        doc.set("geohash", hash);
        collection.store().insert(doc);
    }
    println!();

    let center = GeoPoint::new(50.304328, 7.59378)?;

    // === 2. STRICT RADIUS SEARCH ===
    println!("2. Everything within 3 km");
    println!("-------------------------");

    let query = RadiusQuery::new(center, 3.0, FieldExtractor::new("coordinates")).strict(true);
    for found in collection.fetch_within_with_distance(&query)? {
        println!("   {:<24} {:>6.2} km", found.document.id(), found.distance_km);
    }
    println!();

    // === 3. NON-STRICT SEARCH ===
    println!("3. Every candidate in the scanned cells");
    println!("---------------------------------------");

    let loose = RadiusQuery::new(center, 3.0, FieldExtractor::new("coordinates"));
    for found in collection.fetch_within_with_distance(&loose)? {
        println!("   {:<24} {:>6.2} km", found.document.id(), found.distance_km);
    }
    println!();

    // === 4. REFINED SEARCH ===
    println!("4. Landmarks within 10 km");
    println!("-------------------------");

    let landmarks = RadiusQuery::new(center, 10.0, FieldExtractor::new("coordinates"))
        .refine(|q: Query| {
            q.where_field("kind", FilterOp::Eq, json!("landmark"))
                .order_by("name", Direction::Ascending)
        })
        .strict(true);
    for doc in collection.fetch_within(&landmarks)? {
        println!("   {}", doc.id());
    }
    println!();

    let stats = collection.store().stats();
    println!("Store ran {} range scans over {} documents", stats.queries_run, stats.live_count);

    Ok(())
}
