//! Seeds the document store with sample foods and reviews.
//! Run with: cargo run --bin seed

use restaurant_api::{
    config::Config,
    db::{Collection, Database, Document},
};
use serde_json::json;

fn sample_foods() -> Vec<serde_json::Value> {
    vec![
        json!({
            "foodName": "Chicken Biryani",
            "foodImage": "https://images.example.com/biryani.jpg",
            "foodOrigin": "India",
            "foodCategory": "Rice",
            "price": 12,
            "foodQuantity": 40,
            "foodQuantityType": "plate",
            "description": "Basmati rice layered with spiced chicken.",
            "addedBy": { "name": "Restaurant", "email": "admin@restaurant.dev" },
            "purchaseCount": 0
        }),
        json!({
            "foodName": "Margherita Pizza",
            "foodImage": "https://images.example.com/margherita.jpg",
            "foodOrigin": "Italy",
            "foodCategory": "Pizza",
            "price": 10,
            "foodQuantity": 25,
            "foodQuantityType": "piece",
            "description": "Tomato, mozzarella and basil.",
            "addedBy": { "name": "Restaurant", "email": "admin@restaurant.dev" },
            "purchaseCount": 0
        }),
        json!({
            "foodName": "Tonkotsu Ramen",
            "foodImage": "https://images.example.com/ramen.jpg",
            "foodOrigin": "Japan",
            "foodCategory": "Noodles",
            "price": 14,
            "foodQuantity": 30,
            "foodQuantityType": "bowl",
            "description": "Pork bone broth with chashu and egg.",
            "addedBy": { "name": "Restaurant", "email": "admin@restaurant.dev" },
            "purchaseCount": 0
        }),
    ]
}

fn sample_reviews() -> Vec<serde_json::Value> {
    vec![
        json!({ "name": "Nadia", "rating": 5, "review": "Best biryani in town." }),
        json!({ "name": "Tomas", "rating": 4, "review": "Great ramen, a bit salty." }),
    ]
}

fn as_document(value: serde_json::Value) -> anyhow::Result<Document> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("Seed entry is not an object: {}", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Connecting to document store...");
    let db = Database::connect(&config).await?;
    db.run_migrations().await?;

    for food in sample_foods() {
        let ack = db.store.insert_one(Collection::Foods, as_document(food)?).await?;
        println!("Inserted food {}", ack.inserted_id);
    }

    for review in sample_reviews() {
        let ack = db
            .store
            .insert_one(Collection::Reviews, as_document(review)?)
            .await?;
        println!("Inserted review {}", ack.inserted_id);
    }

    db.close().await;
    println!("Seed complete!");

    Ok(())
}
