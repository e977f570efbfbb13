//! Shopping cart and coupon calls, plus the local totals calculation.
//!
//! The backend owns the cart contents; [`Cart`] is the client's copy of the line items and
//! the coupon the shopper applied. A coupon is never sent back to the backend here. It only
//! discounts the locally computed [`CartTotals`], the same way the web storefront shows them
//! before checkout.

// self
use crate::{
	_prelude::*,
	catalog::Product,
	client::StorefrontClient,
	http::{ApiRequest, Transport},
	obs::{self, OpKind},
};

const CART: &str = "cart";
const COUPONS: &str = "coupons";
const VALIDATE_COUPON: &str = "coupons/validate";

/// Product in the cart together with its quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
	/// Product snapshot as listed by the backend.
	#[serde(flatten)]
	pub product: Product,
	/// Units in the cart.
	pub quantity: u32,
}
impl CartItem {
	/// Price of all units of this line.
	pub fn line_total(&self) -> f64 {
		self.product.price * f64::from(self.quantity)
	}
}

/// Raw cart entry returned by cart mutations: a product id and its quantity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CartLine {
	/// Product identifier.
	pub product: String,
	/// Units in the cart.
	pub quantity: u32,
}

/// Percentage discount owned by the signed-in user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
	/// Code the shopper types in.
	pub code: String,
	/// Discount applied to the subtotal, in percent.
	#[serde(rename = "discountPercentage")]
	pub discount_percentage: f64,
}

/// Subtotal, discount and total of a cart.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CartTotals {
	/// Sum of `price * quantity` over every line.
	pub subtotal: f64,
	/// Amount taken off by the coupon.
	pub discount: f64,
	/// `subtotal - discount`.
	pub total: f64,
}
impl CartTotals {
	/// Computes the totals of `items` with an optional coupon.
	pub fn calculate(items: &[CartItem], coupon: Option<&Coupon>) -> Self {
		let subtotal = items.iter().map(CartItem::line_total).sum::<f64>();
		let discount = coupon.map_or(0., |coupon| subtotal * (coupon.discount_percentage / 100.));

		Self { subtotal, discount, total: subtotal - discount }
	}
}

/// Local view of the cart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
	/// Line items as last fetched.
	pub items: Vec<CartItem>,
	/// Coupon applied by the shopper, if any.
	pub coupon: Option<Coupon>,
}
impl Cart {
	/// Creates a cart without a coupon.
	pub fn new(items: Vec<CartItem>) -> Self {
		Self { items, coupon: None }
	}

	/// Current totals.
	pub fn totals(&self) -> CartTotals {
		CartTotals::calculate(&self.items, self.coupon.as_ref())
	}

	/// Applies `coupon`, replacing any earlier one.
	pub fn apply_coupon(&mut self, coupon: Coupon) -> CartTotals {
		self.coupon = Some(coupon);

		self.totals()
	}

	/// Removes the coupon and returns it.
	pub fn remove_coupon(&mut self) -> Option<Coupon> {
		self.coupon.take()
	}

	/// Total number of units across all lines.
	pub fn units(&self) -> u32 {
		self.items.iter().map(|item| item.quantity).sum()
	}
}

#[derive(Deserialize)]
struct CartEnvelope {
	#[serde(rename = "cartItems")]
	cart_items: Vec<CartItem>,
}

#[derive(Serialize)]
struct ProductRef<'a> {
	#[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
	product_id: Option<&'a str>,
}

#[derive(Serialize)]
struct QuantityBody {
	quantity: u32,
}

#[derive(Serialize)]
struct CodeBody<'a> {
	code: &'a str,
}

impl<T> StorefrontClient<T>
where
	T: ?Sized + Transport,
{
	/// Fetches the signed-in user's cart.
	pub async fn fetch_cart(&self) -> Result<Cart> {
		obs::observe(OpKind::Cart, "fetch_cart", self.fetch_cart_with()).await
	}

	/// Adds one unit of a product.
	pub async fn add_to_cart(&self, product_id: &str) -> Result<Vec<CartLine>> {
		let body = ProductRef { product_id: Some(product_id) };

		obs::observe(OpKind::Cart, "add_to_cart", self.mutate_cart(Method::POST, None, &body)).await
	}

	/// Removes every unit of a product.
	pub async fn remove_from_cart(&self, product_id: &str) -> Result<Vec<CartLine>> {
		let body = ProductRef { product_id: Some(product_id) };

		obs::observe(
			OpKind::Cart,
			"remove_from_cart",
			self.mutate_cart(Method::DELETE, None, &body),
		)
		.await
	}

	/// Empties the cart.
	pub async fn clear_cart(&self) -> Result<Vec<CartLine>> {
		let body = ProductRef { product_id: None };

		obs::observe(OpKind::Cart, "clear_cart", self.mutate_cart(Method::DELETE, None, &body)).await
	}

	/// Sets the quantity of a product; `0` removes it.
	pub async fn update_quantity(&self, product_id: &str, quantity: u32) -> Result<Vec<CartLine>> {
		if quantity == 0 {
			return self.remove_from_cart(product_id).await;
		}

		let body = QuantityBody { quantity };

		obs::observe(
			OpKind::Cart,
			"update_quantity",
			self.mutate_cart(Method::PUT, Some(product_id), &body),
		)
		.await
	}

	/// Fetches the signed-in user's active coupon, if any.
	pub async fn my_coupon(&self) -> Result<Option<Coupon>> {
		obs::observe(OpKind::Coupon, "my_coupon", self.my_coupon_with()).await
	}

	/// Checks `code` against the backend. Unknown and expired codes fail with
	/// [`Error::Api`] carrying status `404`.
	pub async fn validate_coupon(&self, code: &str) -> Result<Coupon> {
		obs::observe(OpKind::Coupon, "validate_coupon", self.validate_coupon_with(code)).await
	}

	/// Validates `code` and applies the coupon to `cart`, returning the new totals.
	///
	/// `cart` is left untouched when validation fails.
	pub async fn apply_coupon(&self, cart: &mut Cart, code: &str) -> Result<CartTotals> {
		let coupon = self.validate_coupon(code).await?;

		Ok(cart.apply_coupon(coupon))
	}

	async fn fetch_cart_with(&self) -> Result<Cart> {
		let url = self.endpoint(CART)?;
		let envelope: CartEnvelope = self.call_json(ApiRequest::get(url)).await?;

		Ok(Cart::new(envelope.cart_items))
	}

	async fn mutate_cart<B>(
		&self,
		method: Method,
		product_id: Option<&str>,
		body: &B,
	) -> Result<Vec<CartLine>>
	where
		B: Serialize,
	{
		let url = match product_id {
			Some(id) => self.resource(CART, id)?,
			None => self.endpoint(CART)?,
		};

		self.call_json(ApiRequest::new(method, url).with_json(body)?).await
	}

	async fn my_coupon_with(&self) -> Result<Option<Coupon>> {
		let url = self.endpoint(COUPONS)?;

		self.call_json(ApiRequest::get(url)).await
	}

	async fn validate_coupon_with(&self, code: &str) -> Result<Coupon> {
		let url = self.endpoint(VALIDATE_COUPON)?;

		self.call_json(ApiRequest::get(url).with_json(&CodeBody { code })?).await
	}
}
