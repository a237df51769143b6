//! [`Reflect`] for standard library types.

use std::time::Duration;

use super::{Reflect, TypeInfo};

macro_rules! value_types {
	($($ty:ty),* $(,)?) => {
		$(
			impl Reflect for $ty {
				fn type_info() -> TypeInfo {
					TypeInfo::value::<$ty>()
				}
			}
		)*
	};
}

value_types!(
	(),
	bool,
	char,
	i8,
	i16,
	i32,
	i64,
	i128,
	isize,
	u8,
	u16,
	u32,
	u64,
	u128,
	usize,
	f32,
	f64,
	String,
	Duration,
);

impl<T: Reflect> Reflect for Option<T> {
	fn type_info() -> TypeInfo {
		TypeInfo::option::<T>()
	}
}

impl<T: Reflect> Reflect for Vec<T> {
	fn type_info() -> TypeInfo {
		TypeInfo::list::<T>()
	}
}

impl<T: Reflect> Reflect for Box<[T]> {
	fn type_info() -> TypeInfo {
		TypeInfo::array::<T>()
	}
}
