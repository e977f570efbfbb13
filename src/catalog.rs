//! Product catalog calls: public listings plus the admin create/delete/feature operations.

// self
use crate::{
	_prelude::*,
	client::StorefrontClient,
	http::{ApiRequest, Transport},
	obs::{self, OpKind},
};

const PRODUCTS: &str = "products";
const FEATURED: &str = "products/featured";
const BY_CATEGORY: &str = "products/category";

/// Catalog product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Backend-assigned identifier; absent on products not yet created.
	#[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Display name.
	pub name: String,
	/// Long-form description.
	pub description: String,
	/// Unit price.
	pub price: f64,
	/// Image URL (or inline data URL when creating).
	pub image: String,
	/// Category slug.
	pub category: String,
	/// Whether the product is shown on the landing page.
	#[serde(rename = "isFeatured", default)]
	pub is_featured: bool,
}

#[derive(Deserialize)]
struct ProductEnvelope {
	product: Product,
}

// Listings arrive either wrapped in `{ "products": [...] }` or as a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductList {
	Wrapped { products: Vec<Product> },
	Bare(Vec<Product>),
}
impl From<ProductList> for Vec<Product> {
	fn from(list: ProductList) -> Self {
		match list {
			ProductList::Wrapped { products } | ProductList::Bare(products) => products,
		}
	}
}

impl<T> StorefrontClient<T>
where
	T: ?Sized + Transport,
{
	/// Lists every product (admin view).
	pub async fn fetch_all_products(&self) -> Result<Vec<Product>> {
		obs::observe(OpKind::Catalog, "fetch_all_products", self.list_products(PRODUCTS)).await
	}

	/// Lists products flagged as featured.
	pub async fn fetch_featured_products(&self) -> Result<Vec<Product>> {
		obs::observe(OpKind::Catalog, "fetch_featured_products", self.list_products(FEATURED)).await
	}

	/// Lists the products of one category.
	pub async fn fetch_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
		obs::observe(
			OpKind::Catalog,
			"fetch_products_by_category",
			self.list_category(category),
		)
		.await
	}

	/// Creates a product and returns it as stored by the backend.
	pub async fn create_product(&self, product: &Product) -> Result<Product> {
		obs::observe(OpKind::Catalog, "create_product", self.create_product_with(product)).await
	}

	/// Deletes a product.
	pub async fn delete_product(&self, product_id: &str) -> Result<()> {
		obs::observe(OpKind::Catalog, "delete_product", self.delete_product_with(product_id)).await
	}

	/// Flips a product's featured flag and returns the updated product.
	pub async fn toggle_featured_product(&self, product_id: &str) -> Result<Product> {
		obs::observe(
			OpKind::Catalog,
			"toggle_featured_product",
			self.toggle_featured_with(product_id),
		)
		.await
	}

	async fn list_products(&self, path: &str) -> Result<Vec<Product>> {
		let url = self.endpoint(path)?;
		let list: ProductList = self.call_json(ApiRequest::get(url)).await?;

		Ok(list.into())
	}

	async fn list_category(&self, category: &str) -> Result<Vec<Product>> {
		let url = self.resource(BY_CATEGORY, category)?;
		let list: ProductList = self.call_json(ApiRequest::get(url)).await?;

		Ok(list.into())
	}

	async fn create_product_with(&self, product: &Product) -> Result<Product> {
		let url = self.endpoint(PRODUCTS)?;
		let envelope: ProductEnvelope =
			self.call_json(ApiRequest::post(url).with_json(product)?).await?;

		Ok(envelope.product)
	}

	async fn delete_product_with(&self, product_id: &str) -> Result<()> {
		let url = self.resource(PRODUCTS, product_id)?;

		self.call(ApiRequest::delete(url)).await?;

		Ok(())
	}

	async fn toggle_featured_with(&self, product_id: &str) -> Result<Product> {
		let url = self.resource(PRODUCTS, product_id)?;
		let envelope: ProductEnvelope =
			self.call_json(ApiRequest::new(Method::PATCH, url)).await?;

		Ok(envelope.product)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn product_reads_backend_shape() {
		let product: Product = serde_json::from_str(
			r#"{"_id":"p1","name":"Mug","description":"Stoneware","price":12.5,"image":"https://cdn.example.com/mug.png","category":"kitchen","isFeatured":true,"__v":0}"#,
		)
		.expect("Product fixture should deserialize.");

		assert_eq!(product.id.as_deref(), Some("p1"));
		assert!(product.is_featured);
	}

	#[test]
	fn new_products_serialize_without_id() {
		let product = Product {
			id: None,
			name: "Mug".into(),
			description: "Stoneware".into(),
			price: 12.5,
			image: "data:image/png;base64,AAAA".into(),
			category: "kitchen".into(),
			is_featured: false,
		};
		let value = serde_json::to_value(&product).expect("Product should serialize.");

		assert!(value.get("_id").is_none());
		assert_eq!(value["isFeatured"], false);
	}

	#[test]
	fn listings_accept_wrapped_and_bare_arrays() {
		let item = r#"{"name":"Mug","description":"","price":1.0,"image":"","category":"kitchen"}"#;
		let wrapped: ProductList = serde_json::from_str(&format!(r#"{{"products":[{item}]}}"#))
			.expect("Wrapped listing should deserialize.");
		let bare: ProductList =
			serde_json::from_str(&format!("[{item}]")).expect("Bare listing should deserialize.");

		assert_eq!(Vec::from(wrapped).len(), 1);
		assert_eq!(Vec::from(bare).len(), 1);
	}
}
