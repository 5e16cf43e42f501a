//! Demo scenario driver
//!
//! Seeds a small catalog and walks the engines through placement,
//! completion, refund, cart reservation and search, logging each step.
//! Safe to re-run against an existing database: seeding skips products
//! that already exist and generated ids are unique per run.

use rust_decimal::Decimal;
use tracing::{info, warn};

use shared::models::{CartItem, OrderItemInput, OrderStatus, Product};
use shared::util::now_millis;

use crate::common::error::{ShopError, ShopResult};
use crate::state::ShopState;

const TSHIRT_ID: &str = "1";
const JEANS_ID: &str = "2";

fn seed_product(state: &ShopState, product: Product) -> ShopResult<()> {
    let id = product.id.clone();
    match state.catalog.create_product(product) {
        Ok(p) => {
            info!(product_id = %p.id, name = %p.name, stock = p.stock, "Seeded product");
            Ok(())
        }
        Err(ShopError::ProductAlreadyExists(_)) => {
            info!(product_id = %id, "Product already seeded");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub fn run(state: &ShopState) -> ShopResult<()> {
    let run_id = now_millis();

    // Seed the catalog
    seed_product(
        state,
        Product {
            brand: "ACME Apparel".into(),
            description: "100% cotton crew neck t-shirt".into(),
            color: "Red".into(),
            size: "M".into(),
            ..Product::new(TSHIRT_ID, "T-Shirt", Decimal::new(1999, 2), 50)
        },
    )?;
    seed_product(
        state,
        Product {
            brand: "DenimCo".into(),
            description: "Blue slim-fit denim jeans".into(),
            color: "Blue".into(),
            size: "32".into(),
            ..Product::new(JEANS_ID, "Slim Jeans", Decimal::new(4999, 2), 30)
        },
    )?;

    // Place an order and walk it through its lifecycle
    let order_id = format!("order-{run_id}");
    let order = state.orders.place_order(
        &order_id,
        &[OrderItemInput::new(TSHIRT_ID, 2)],
        OrderStatus::Processing,
    )?;
    info!(
        order_id = %order.id,
        status = %order.status,
        stock = state.catalog.get_product(TSHIRT_ID)?.stock,
        "Placed order for 2 x T-Shirt"
    );

    let processing = state.orders.get_orders_by_status(OrderStatus::Processing)?;
    info!(count = processing.len(), "Orders currently processing");

    state
        .orders
        .update_order_status(&order_id, OrderStatus::Completed)?;
    let refunded = state.orders.refund_order(&order_id)?;
    info!(
        order_id = %refunded.id,
        status = %refunded.status,
        stock = state.catalog.get_product(TSHIRT_ID)?.stock,
        "Order refunded, stock restored"
    );

    // Refunding twice is rejected
    if let Err(e) = state.orders.refund_order(&order_id) {
        warn!(order_id = %order_id, error = %e, "Second refund rejected");
    }

    // Reserve stock for a cart and total it
    let cart_id = format!("cart-{run_id}");
    let items = vec![CartItem::new(TSHIRT_ID, 1), CartItem::new(JEANS_ID, 2)];
    let total = state.carts.calculate_cart_total(&items)?;
    let cart = state.carts.reserve_stock_for_cart(&cart_id, items)?;
    info!(cart_id = %cart.id, %total, "Cart reserved and totalled");
    state.stock.release_reserved_stock(TSHIRT_ID, 1)?;
    state.stock.release_reserved_stock(JEANS_ID, 2)?;

    // Warehouse movements
    state.stock.goods_in(JEANS_ID, 10)?;
    state.stock.goods_out(JEANS_ID, 10)?;

    // Search
    let hits = state.catalog.search_products("shirt")?;
    info!(count = hits.len(), "Products matching 'shirt'");

    // The ledger replays to current stock
    for product in state.catalog.get_all_products()? {
        let sum = state.stock.movement_sum(&product.id)?;
        info!(
            product_id = %product.id,
            stock = product.stock,
            ledger_sum = sum,
            "Ledger reconciliation"
        );
    }
    info!(
        movements = state.stock.movements()?.len(),
        "Demo finished"
    );

    Ok(())
}
