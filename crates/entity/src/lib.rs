pub mod user;
pub mod post;
pub mod favorite;
pub mod folder;
pub mod folder_item;

pub use user::Entity as User;
pub use post::Entity as Post;
pub use favorite::Entity as Favorite;
pub use folder::Entity as Folder;
pub use folder_item::Entity as FolderItem;
