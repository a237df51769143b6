//! Convention objects: reusable plan configuration for one or both directions.

use crate::error::Result;
use crate::plan::{MappingPlan, PlanView, Remap};

/// Configures the plan for `F` to `T` before automapping.
pub trait OneWayMap<F, T, C>: Send + 'static {
	fn override_mapping(&self, plan: &mut MappingPlan<'_, F, T, C>) -> Result<()>;
}

/// Configures the plans for `A` to `B` and `B` to `A`.
///
/// [`both_directions`](Self::both_directions) runs first in each direction;
/// the direction-specific hooks run after it.
pub trait TwoWayMap<A, B, C>: Send + Sync + 'static {
	/// Member pairings that hold in both directions.
	fn both_directions(&self, _map: &mut Bidirectional<'_, '_, C>) -> Result<()> {
		Ok(())
	}

	fn a_to_b(&self, _plan: &mut MappingPlan<'_, A, B, C>) -> Result<()> {
		Ok(())
	}

	fn b_to_a(&self, _plan: &mut MappingPlan<'_, B, A, C>) -> Result<()> {
		Ok(())
	}
}

/// Declares a member pairing once and applies it to whichever direction is
/// being configured.
pub struct Bidirectional<'a, 'p, C> {
	view: &'a mut PlanView<'p, C>,
	reversed: bool,
}

impl<'a, 'p, C: 'static> Bidirectional<'a, 'p, C> {
	pub(crate) fn forward(view: &'a mut PlanView<'p, C>) -> Self {
		Self { view, reversed: false }
	}

	pub(crate) fn reverse(view: &'a mut PlanView<'p, C>) -> Self {
		Self { view, reversed: true }
	}

	/// Whether the plan being configured maps `B` to `A`.
	pub fn is_reversed(&self) -> bool {
		self.reversed
	}

	/// Pairs member `a` of `A` with member `b` of `B`.
	pub fn pair(&mut self, a: &str, b: &str) -> Result<&mut Self> {
		self.pair_remap(a, b, Remap::Auto)
	}

	pub fn pair_remap(&mut self, a: &str, b: &str, remap: Remap) -> Result<&mut Self> {
		let (to, from) = if self.reversed { (a, b) } else { (b, a) };
		self.view.set_member(to, from, remap)?;
		Ok(self)
	}

	/// Leaves member `a` of `A` untouched when mapping into `A`.
	pub fn ignore_a(&mut self, a: &str) -> Result<&mut Self> {
		if self.reversed {
			self.view.ignore(a)?;
		}
		Ok(self)
	}

	/// Leaves member `b` of `B` untouched when mapping into `B`.
	pub fn ignore_b(&mut self, b: &str) -> Result<&mut Self> {
		if !self.reversed {
			self.view.ignore(b)?;
		}
		Ok(self)
	}
}
