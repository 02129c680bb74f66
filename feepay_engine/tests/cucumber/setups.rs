use cucumber::given;

use crate::{cucumber::FeePayWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut FeePayWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given(expr = "product {word} sells for Rp{int}")]
async fn product_on_sale(world: &mut FeePayWorld, sku: String, price: i64) {
    world.system().seed_product(&sku, price).await;
}
