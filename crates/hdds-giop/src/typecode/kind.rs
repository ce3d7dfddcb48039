// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CORBA TCKind values.

/// TCKind identifies the shape of a TypeCode on the wire.
///
/// The numeric values are fixed by the CORBA Interface Repository and are
/// read as a `ulong` at the start of every TypeCode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TcKind {
    // --- Primitive kinds ---
    Null = 0,
    Void = 1,
    Short = 2,
    Long = 3,
    UShort = 4,
    ULong = 5,
    Float = 6,
    Double = 7,
    Boolean = 8,
    Char = 9,
    Octet = 10,
    Any = 11,
    TypeCode = 12,
    Principal = 13,

    // --- Constructed kinds ---
    ObjRef = 14,
    Struct = 15,
    Union = 16,
    Enum = 17,

    // --- Templates ---
    /// Bounded or unbounded narrow string
    String = 18,
    Sequence = 19,
    Array = 20,
    Alias = 21,
    Except = 22,

    // --- CORBA 2.x additions ---
    LongLong = 23,
    ULongLong = 24,
    /// IEEE extended, 16 bytes
    LongDouble = 25,
    WChar = 26,
    WString = 27,
    /// Packed decimal (digits, scale)
    Fixed = 28,
    Value = 29,
    ValueBox = 30,
    Native = 31,
    AbstractInterface = 32,
}

impl TcKind {
    /// Kinds whose TypeCode carries no parameters at all.
    pub const fn is_parameterless(self) -> bool {
        matches!(
            self,
            TcKind::Null
                | TcKind::Void
                | TcKind::Short
                | TcKind::Long
                | TcKind::UShort
                | TcKind::ULong
                | TcKind::Float
                | TcKind::Double
                | TcKind::Boolean
                | TcKind::Char
                | TcKind::Octet
                | TcKind::Any
                | TcKind::TypeCode
                | TcKind::Principal
                | TcKind::LongLong
                | TcKind::ULongLong
                | TcKind::LongDouble
                | TcKind::WChar
        )
    }

    /// Kinds whose parameters travel inside an encapsulation.
    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            TcKind::ObjRef
                | TcKind::Struct
                | TcKind::Union
                | TcKind::Enum
                | TcKind::Sequence
                | TcKind::Array
                | TcKind::Alias
                | TcKind::Except
                | TcKind::Value
                | TcKind::ValueBox
                | TcKind::Native
                | TcKind::AbstractInterface
        )
    }

    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Convert from the wire value. Returns `None` for kinds outside 0..=32.
    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => TcKind::Null,
            1 => TcKind::Void,
            2 => TcKind::Short,
            3 => TcKind::Long,
            4 => TcKind::UShort,
            5 => TcKind::ULong,
            6 => TcKind::Float,
            7 => TcKind::Double,
            8 => TcKind::Boolean,
            9 => TcKind::Char,
            10 => TcKind::Octet,
            11 => TcKind::Any,
            12 => TcKind::TypeCode,
            13 => TcKind::Principal,
            14 => TcKind::ObjRef,
            15 => TcKind::Struct,
            16 => TcKind::Union,
            17 => TcKind::Enum,
            18 => TcKind::String,
            19 => TcKind::Sequence,
            20 => TcKind::Array,
            21 => TcKind::Alias,
            22 => TcKind::Except,
            23 => TcKind::LongLong,
            24 => TcKind::ULongLong,
            25 => TcKind::LongDouble,
            26 => TcKind::WChar,
            27 => TcKind::WString,
            28 => TcKind::Fixed,
            29 => TcKind::Value,
            30 => TcKind::ValueBox,
            31 => TcKind::Native,
            32 => TcKind::AbstractInterface,
            _ => return None,
        })
    }

    /// IDL spelling, as shown to users.
    pub const fn name(self) -> &'static str {
        match self {
            TcKind::Null => "tk_null",
            TcKind::Void => "tk_void",
            TcKind::Short => "tk_short",
            TcKind::Long => "tk_long",
            TcKind::UShort => "tk_ushort",
            TcKind::ULong => "tk_ulong",
            TcKind::Float => "tk_float",
            TcKind::Double => "tk_double",
            TcKind::Boolean => "tk_boolean",
            TcKind::Char => "tk_char",
            TcKind::Octet => "tk_octet",
            TcKind::Any => "tk_any",
            TcKind::TypeCode => "tk_TypeCode",
            TcKind::Principal => "tk_Principal",
            TcKind::ObjRef => "tk_objref",
            TcKind::Struct => "tk_struct",
            TcKind::Union => "tk_union",
            TcKind::Enum => "tk_enum",
            TcKind::String => "tk_string",
            TcKind::Sequence => "tk_sequence",
            TcKind::Array => "tk_array",
            TcKind::Alias => "tk_alias",
            TcKind::Except => "tk_except",
            TcKind::LongLong => "tk_longlong",
            TcKind::ULongLong => "tk_ulonglong",
            TcKind::LongDouble => "tk_longdouble",
            TcKind::WChar => "tk_wchar",
            TcKind::WString => "tk_wstring",
            TcKind::Fixed => "tk_fixed",
            TcKind::Value => "tk_value",
            TcKind::ValueBox => "tk_value_box",
            TcKind::Native => "tk_native",
            TcKind::AbstractInterface => "tk_abstract_interface",
        }
    }
}

impl std::fmt::Display for TcKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
