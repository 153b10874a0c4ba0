//! Shapes of feedback behaviors.
//!
//! A component's view is built before its model, yet it displays what the
//! model computes. The behaviors flowing back from model to view are
//! described by a `Feedback` type: a single behavior, a tuple of them, a
//! vector, or a user-defined record. `Now::fix` declares placeholders in
//! that shape, hands them to the view and later ties them to whatever the
//! model returns.

use crate::behavior::{Behavior, Placeholder};
use crate::error::{Error, Result};


/// A collection of behaviors that can be forward-declared.
pub trait Feedback: Sized + 'static {
    /// The placeholders backing a declared value.
    type Slots;

    /// Declare `arity` placeholders and the value standing in for them.
    ///
    /// Fails with `Error::ArityMismatch` if `arity` does not fit the shape
    /// of `Self`.
    fn declare(arity: usize) -> Result<(Self::Slots, Self)>;

    /// Number of behaviors contained.
    fn len(&self) -> usize;

    /// Whether there are no behaviors at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every placeholder by the matching behavior of `real`.
    ///
    /// Either all placeholders are replaced or, on error, none of them.
    fn tie(slots: &Self::Slots, real: &Self) -> Result<()>;
}

/// A feedback shape with a fixed number of behaviors.
pub trait StaticFeedback: Feedback {
    /// Number of placeholders this shape declares.
    const ARITY: usize;
}

fn check(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ArityMismatch { expected, found })
    }
}

impl Feedback for () {
    type Slots = ();

    fn declare(arity: usize) -> Result<((), ())> {
        check(arity, 0).map(|()| ((), ()))
    }

    fn len(&self) -> usize { 0 }

    fn tie(_: &(), _: &()) -> Result<()> { Ok(()) }
}

impl StaticFeedback for () {
    const ARITY: usize = 0;
}

impl<A: Clone + Send + Sync + 'static> Feedback for Behavior<A> {
    type Slots = Placeholder<A>;

    fn declare(arity: usize) -> Result<(Placeholder<A>, Behavior<A>)> {
        check(arity, 1)?;
        let slot = Placeholder::new();
        let behavior = slot.behavior();
        Ok((slot, behavior))
    }

    fn len(&self) -> usize { 1 }

    fn tie(slot: &Placeholder<A>, real: &Behavior<A>) -> Result<()> {
        slot.replace_with(real)
    }
}

impl<A: Clone + Send + Sync + 'static> StaticFeedback for Behavior<A> {
    const ARITY: usize = 1;
}

macro_rules! impl_tuple {
    ($n:expr; $($t:ident $i:tt),+) => {
        impl<$($t: Clone + Send + Sync + 'static),+> Feedback for ($(Behavior<$t>,)+) {
            type Slots = ($(Placeholder<$t>,)+);

            fn declare(arity: usize) -> Result<(Self::Slots, Self)> {
                check(arity, $n)?;
                let slots = ($(Placeholder::<$t>::new(),)+);
                let behaviors = ($(slots.$i.behavior(),)+);
                Ok((slots, behaviors))
            }

            fn len(&self) -> usize { $n }

            fn tie(slots: &Self::Slots, real: &Self) -> Result<()> {
                if [$(slots.$i.is_replaced()),+].iter().any(|replaced| *replaced) {
                    return Err(Error::AlreadyReplaced);
                }
                $(slots.$i.replace_with(&real.$i)?;)+
                Ok(())
            }
        }

        impl<$($t: Clone + Send + Sync + 'static),+> StaticFeedback for ($(Behavior<$t>,)+) {
            const ARITY: usize = $n;
        }
    }
}

impl_tuple!(2; A 0, B 1);
impl_tuple!(3; A 0, B 1, C 2);
impl_tuple!(4; A 0, B 1, C 2, D 3);

impl<A: Clone + Send + Sync + 'static> Feedback for Vec<Behavior<A>> {
    type Slots = Vec<Placeholder<A>>;

    fn declare(arity: usize) -> Result<(Vec<Placeholder<A>>, Vec<Behavior<A>>)> {
        let slots: Vec<Placeholder<A>> = (0..arity).map(|_| Placeholder::new()).collect();
        let behaviors = slots.iter().map(Placeholder::behavior).collect();
        Ok((slots, behaviors))
    }

    fn len(&self) -> usize { Vec::len(self) }

    fn tie(slots: &Vec<Placeholder<A>>, real: &Vec<Behavior<A>>) -> Result<()> {
        check(slots.len(), real.len())?;
        if slots.iter().any(Placeholder::is_replaced) {
            return Err(Error::AlreadyReplaced);
        }
        for (slot, behavior) in slots.iter().zip(real) {
            slot.replace_with(behavior)?;
        }
        Ok(())
    }
}
