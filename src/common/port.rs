//! Port Declarations.
//!
//! A device's signal interface is described once, as a `const` table of
//! [`PortDecl`] entries bundled into a [`PortSet`]. Device modules also expose
//! typed [`Port`] handles for each entry so accessors know the Rust value type
//! a port is read and written as.
//!
//! The clock and reset inputs are part of every port set but are owned by the
//! clock engine; they are not listed among the user-accessible ports.

use std::fmt;
use std::marker::PhantomData;

/// Direction of a port as seen from the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Driven by the testbench, sampled by the device.
    Input,
    /// Driven by the device, sampled by the testbench.
    Output,
}

/// Untyped declaration of a single named port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortDecl {
    /// Signal name as exposed by the circuit model.
    pub name: &'static str,
    /// Input or output.
    pub direction: PortDirection,
    /// Width in bits (1..=64).
    pub width: u32,
}

impl PortDecl {
    /// Declares an input port.
    pub const fn input(name: &'static str, width: u32) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            width,
        }
    }

    /// Declares an output port.
    pub const fn output(name: &'static str, width: u32) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            width,
        }
    }

    /// Returns the mask selecting the port's low `width` bits.
    pub const fn mask(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }
}

impl fmt::Display for PortDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        write!(f, "{} {}[{}]", dir, self.name, self.width)
    }
}

/// Rust value types a port can be read or written as.
///
/// Values are unsigned and zero-extended; there is no sign extension at any
/// width. One-bit strobes and flags use `u8`.
pub trait PortValue: Copy + fmt::Debug {
    /// Widest port this type can carry.
    const BITS: u32;

    /// Truncates a raw port value into `Self`.
    fn from_raw(raw: u64) -> Self;

    /// Zero-extends `self` into a raw port value.
    fn into_raw(self) -> u64;
}

impl PortValue for u8 {
    const BITS: u32 = 8;

    fn from_raw(raw: u64) -> Self {
        raw as u8
    }

    fn into_raw(self) -> u64 {
        self as u64
    }
}

impl PortValue for u32 {
    const BITS: u32 = 32;

    fn from_raw(raw: u64) -> Self {
        raw as u32
    }

    fn into_raw(self) -> u64 {
        self as u64
    }
}

impl PortValue for u64 {
    const BITS: u32 = 64;

    fn from_raw(raw: u64) -> Self {
        raw
    }

    fn into_raw(self) -> u64 {
        self
    }
}

/// A port declaration tagged with the value type it is accessed as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Port<T: PortValue> {
    decl: PortDecl,
    _value: PhantomData<T>,
}

impl<T: PortValue> Port<T> {
    /// Declares a typed input port.
    pub const fn input(name: &'static str, width: u32) -> Self {
        Self {
            decl: PortDecl::input(name, width),
            _value: PhantomData,
        }
    }

    /// Declares a typed output port.
    pub const fn output(name: &'static str, width: u32) -> Self {
        Self {
            decl: PortDecl::output(name, width),
            _value: PhantomData,
        }
    }

    /// Returns the untyped declaration.
    pub const fn decl(&self) -> PortDecl {
        self.decl
    }

    pub const fn name(&self) -> &'static str {
        self.decl.name
    }
}

/// Clock input driven by the clock engine.
pub const CLOCK: PortDecl = PortDecl::input("clk", 1);

/// Synchronous reset input driven during initialization.
pub const RESET: PortDecl = PortDecl::input("rst", 1);

/// Idle value override for one input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleValue {
    pub port: &'static str,
    pub value: u64,
}

impl IdleValue {
    pub const fn new(port: &'static str, value: u64) -> Self {
        Self { port, value }
    }
}

/// The fixed signal interface of one device specialization.
#[derive(Debug)]
pub struct PortSet {
    /// Top-level module name, used as the root trace scope.
    pub name: &'static str,
    /// User-accessible ports, excluding clock and reset.
    pub ports: &'static [PortDecl],
    /// Inputs whose idle value is not zero.
    idle: &'static [IdleValue],
}

impl PortSet {
    /// Declares a port set.
    ///
    /// Every input not listed in `idle` idles at zero.
    pub const fn new(
        name: &'static str,
        ports: &'static [PortDecl],
        idle: &'static [IdleValue],
    ) -> Self {
        Self { name, ports, idle }
    }

    /// Looks up a user-accessible port by name.
    pub fn find(&self, name: &str) -> Option<&PortDecl> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Checks whether `decl` is one of the user-accessible ports.
    pub fn contains(&self, decl: &PortDecl) -> bool {
        self.ports.iter().any(|p| p == decl)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &PortDecl> + '_ {
        self.ports.iter().filter(|p| p.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &PortDecl> + '_ {
        self.ports.iter().filter(|p| p.is_output())
    }

    /// Returns the value `port` is driven to when the device is idle.
    pub fn idle_value(&self, port: &PortDecl) -> u64 {
        self.idle
            .iter()
            .find(|i| i.port == port.name)
            .map(|i| i.value & port.mask())
            .unwrap_or(0)
    }

    /// Returns every declared port including clock and reset, in trace order.
    pub fn all(&self) -> impl Iterator<Item = &PortDecl> + '_ {
        [&CLOCK, &RESET].into_iter().chain(self.ports.iter())
    }
}

impl PartialEq for PortSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ports == other.ports
    }
}

impl Eq for PortSet {}
