//! Cart data model: products, cart lines, and the mutation rules.
//!
//! The `Cart` is an ordered collection of `CartLine`s keyed by product id
//! (ids unique, insertion order preserved). All quantity bookkeeping lives
//! here; the service layer only decides when to persist and publish.

use serde::{Deserialize, Serialize};

/// A product descriptor as handed to `add_to_cart`.
///
/// Carries no quantity: quantity is owned by the cart line. Adding a product
/// whose id is already in the cart bumps that line's quantity and ignores the
/// rest of the descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,
}

/// One product entry in the cart with its quantity.
///
/// Invariant: `quantity >= 1` while the line is in the cart. A decrement that
/// would reach zero removes the line instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,
    pub quantity: u32,
}

impl CartLine {
    fn from_product(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: 1,
        }
    }
}

/// The ordered, id-keyed collection of cart lines for the current session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from a persisted snapshot.
    ///
    /// Lines with a zero quantity are dropped so the `quantity >= 1` invariant
    /// holds even if an older snapshot predates the removal-at-zero rule.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self {
            lines: lines.into_iter().filter(|l| l.quantity >= 1).collect(),
        }
    }

    /// Adds a product: a new line at quantity 1, or +1 on the existing line.
    ///
    /// When the id is already present, the existing line's title, image and
    /// price are kept as-is; only the quantity changes.
    pub fn add(&mut self, product: Product) {
        match self.lines.iter_mut().find(|l| l.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::from_product(product)),
        }
    }

    /// Increments the quantity of the line with `id` by 1.
    ///
    /// Returns whether a line matched; an absent id leaves the cart unchanged.
    pub fn increment(&mut self, id: &str) -> bool {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.quantity += 1;
                true
            }
            None => false,
        }
    }

    /// Decrements the quantity of the line with `id` by 1.
    ///
    /// A line at quantity 1 is removed from the cart entirely (removal at
    /// zero). Returns whether a line matched.
    pub fn decrement(&mut self, id: &str) -> bool {
        let Some(pos) = self.lines.iter().position(|l| l.id == id) else {
            return false;
        };
        if self.lines[pos].quantity > 1 {
            self.lines[pos].quantity -= 1;
        } else {
            self.lines.remove(pos);
        }
        true
    }

    /// The current lines, in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// An owned copy of the current lines, for publishing and persistence.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Total price of the cart (unit price times quantity, summed).
    pub fn total_price(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.price * f64::from(l.quantity))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            title: format!("Product {}", id),
            image_url: format!("https://img.example/{}.png", id),
            price,
        }
    }

    #[test]
    fn add_distinct_products_creates_one_line_each() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));
        cart.add(product("b", 20.0));
        cart.add(product("c", 5.5));

        assert_eq!(cart.len(), 3);
        assert!(cart.lines().iter().all(|l| l.quantity == 1));
        assert_eq!(
            cart.lines().iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn add_same_product_twice_bumps_quantity_and_ignores_new_fields() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));

        let mut changed = product("a", 99.0);
        changed.title = "renamed".to_string();
        cart.add(changed);

        assert_eq!(cart.len(), 1);
        let line = &cart.lines()[0];
        assert_eq!(line.quantity, 2);
        assert_eq!(line.price, 10.0);
        assert_eq!(line.title, "Product a");
    }

    #[test]
    fn increment_absent_id_is_a_no_op() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));
        let before = cart.snapshot();

        assert!(!cart.increment("missing"));
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn decrement_from_two_leaves_one() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));
        cart.add(product("a", 10.0));

        assert!(cart.decrement("a"));
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn decrement_from_one_removes_the_line() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));
        cart.add(product("b", 20.0));

        assert!(cart.decrement("a"));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].id, "b");
    }

    #[test]
    fn decrement_absent_id_is_a_no_op() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));
        let before = cart.snapshot();

        assert!(!cart.decrement("missing"));
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn from_lines_drops_zero_quantity_entries() {
        let mut zero = CartLine::from_product(product("z", 1.0));
        zero.quantity = 0;
        let ok = CartLine::from_product(product("a", 10.0));

        let cart = Cart::from_lines(vec![zero, ok]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].id, "a");
    }

    #[test]
    fn totals_sum_across_lines() {
        let mut cart = Cart::new();
        cart.add(product("a", 10.0));
        cart.add(product("a", 10.0));
        cart.add(product("b", 2.5));

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), 22.5);
    }
}
