pub mod cart;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod webhook_event;

pub use cart::Entity as Cart;
pub use cart::Model as CartModel;
pub use cart_item::Entity as CartItem;
pub use cart_item::Model as CartItemModel;
pub use category::Entity as Category;
pub use category::Model as CategoryModel;
pub use order::Entity as Order;
pub use order::Model as OrderModel;
pub use order_item::Entity as OrderItem;
pub use order_item::Model as OrderItemModel;
pub use product::Entity as Product;
pub use product::Model as ProductModel;
pub use webhook_event::Entity as WebhookEvent;
pub use webhook_event::Model as WebhookEventModel;
