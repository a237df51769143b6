//! Standard converters between primitives and strings.

use std::any::TypeId;
use std::fmt::Display;

use crate::error::Result;
use crate::registry::ResourceMapper;
use crate::types::Reflect;

#[track_caller]
fn checked<F, T, C>(mapper: &mut ResourceMapper<C>) -> Result<()>
where
	F: Reflect + Copy + Send + Sync,
	T: Reflect + TryFrom<F>,
	<T as TryFrom<F>>::Error: Display,
	C: 'static,
{
	if TypeId::of::<F>() == TypeId::of::<T>() {
		return Ok(());
	}
	mapper.try_convert_using(|v: &F| T::try_from(*v))?;
	Ok(())
}

macro_rules! integers_from {
	(@each $mapper:expr, $from:ty; $($to:ty),*) => {
		$( checked::<$from, $to, _>($mapper)?; )*
	};
	($mapper:expr, $from:ty) => {
		integers_from!(@each $mapper, $from; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize)
	};
}

macro_rules! integer_conversions {
	($mapper:expr; $($from:ty),*) => {
		$(
			integers_from!($mapper, $from);
			$mapper.convert_using(|v: &$from| *v as f32)?;
			$mapper.convert_using(|v: &$from| *v as f64)?;
		)*
	};
}

macro_rules! string_conversions {
	($mapper:expr; $($ty:ty),*) => {
		$(
			$mapper.convert_using(|v: &$ty| v.to_string())?;
			$mapper.try_convert_using(|v: &String| v.trim().parse::<$ty>())?;
		)*
	};
}

impl<C: 'static> ResourceMapper<C> {
	/// Registers conversions between every pair of integer types (checked),
	/// from integers to floats, between `f32` and `f64`, from numbers, `bool`
	/// and `char` to `String`, and from `String` to numbers and `bool`.
	#[track_caller]
	pub fn load_standard_converters(&mut self) -> Result<&mut Self> {
		integer_conversions!(self; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
		self.convert_using(|v: &f32| f64::from(*v))?;
		self.convert_using(|v: &f64| *v as f32)?;
		string_conversions!(self; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool);
		self.convert_using(|v: &char| v.to_string())?;
		tracing::trace!("registered standard converters");
		Ok(self)
	}
}
