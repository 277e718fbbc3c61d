pub mod flip;
pub mod identity_key;
pub mod keyed_collection;
pub mod paired_transform;
pub mod resize;
pub mod tensor;

pub mod utils {
    pub mod image_helper;
}
