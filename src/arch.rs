use crate::error::{ErrorInfo, LayoutError, LayoutErrorKind};
use crate::types::ScalarKind;
use serde::Serialize;

/// Supported target architectures. One descriptor exists per variant; there
/// is no way to construct a descriptor for anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Architecture {
    Arm32,
    Arm64,
    I686,
    X86_64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Endianness {
    Little,
    Big,
}

/// Width and alignment of one primitive type, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarTraits {
    pub size: u32,
    pub align: u32,
}

const fn traits(size: u32, align: u32) -> ScalarTraits {
    ScalarTraits { size, align }
}

/// Everything a real compiler's built-in environment contributes to layout:
/// primitive widths and alignments, numeric limits, endianness, and the
/// predefined identifiers normally injected before the first header line.
///
/// Constructed once per target as a `&'static` record and shared by
/// reference; two targets never alias the same descriptor.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ArchDescriptor {
    pub target: Architecture,
    pub endianness: Endianness,

    pub c_bool: ScalarTraits,
    pub c_char: ScalarTraits,
    pub c_short: ScalarTraits,
    pub c_int: ScalarTraits,
    pub c_long: ScalarTraits,
    pub c_long_long: ScalarTraits,
    pub c_float: ScalarTraits,
    pub c_double: ScalarTraits,
    pub c_long_double: ScalarTraits,
    pub pointer: ScalarTraits,
    /// size_t / ptrdiff_t / intptr_t.
    pub size_type: ScalarTraits,

    /// Value of `__BIGGEST_ALIGNMENT__` for this target.
    pub biggest_align: u32,

    pub long_max: i64,
    pub intmax_max: i64,
    pub size_max: u64,
    pub uintmax_max: u64,
    pub ptrdiff_max: i64,
    pub intptr_max: i64,
    pub uintptr_max: u64,

    /// Predefined identifier -> literal text, used to seed macro evaluation
    /// upstream. Mirrors the per-target builtin header a compiler injects.
    pub predefined: &'static [(&'static str, &'static str)],
}

impl ArchDescriptor {
    pub fn scalar(&self, kind: ScalarKind) -> ScalarTraits {
        use ScalarKind::*;

        match kind {
            Bool => self.c_bool,
            Char | SChar | UChar => self.c_char,
            Short | UShort => self.c_short,
            Int | UInt => self.c_int,
            Long | ULong => self.c_long,
            LongLong | ULongLong => self.c_long_long,
            Float => self.c_float,
            Double => self.c_double,
            LongDouble => self.c_long_double,
            SizeT | PtrdiffT => self.size_type,
        }
    }

    pub fn pointer_width(&self) -> u32 {
        self.pointer.size
    }
}

impl Architecture {
    pub fn all() -> [Architecture; 4] {
        [
            Architecture::Arm32,
            Architecture::Arm64,
            Architecture::I686,
            Architecture::X86_64,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Architecture::Arm32 => "arm32",
            Architecture::Arm64 => "arm64",
            Architecture::I686 => "i686",
            Architecture::X86_64 => "x86_64",
        }
    }

    pub fn from_name(name: &str) -> Result<Architecture, LayoutError> {
        match name {
            "arm32" | "armv7" | "arm" => Ok(Architecture::Arm32),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "i686" | "i386" | "x86" => Ok(Architecture::I686),
            "x86_64" | "amd64" => Ok(Architecture::X86_64),
            _ => Err(LayoutError::new(LayoutErrorKind::UnknownTarget)
                .with(ErrorInfo::Name(name.to_string()))),
        }
    }
}

/// Look up the immutable descriptor for a target.
pub fn describe(target: Architecture) -> &'static ArchDescriptor {
    match target {
        Architecture::Arm32 => &ARM32,
        Architecture::Arm64 => &ARM64,
        Architecture::I686 => &I686,
        Architecture::X86_64 => &X86_64,
    }
}

// The numeric values below reproduce what the vendor toolchain reports for
// each target. Darwin flavor throughout: long double is plain double on both
// ARM targets and an x87 16-byte slot on the x86 ones.

static ARM32: ArchDescriptor = ArchDescriptor {
    target: Architecture::Arm32,
    endianness: Endianness::Little,
    c_bool: traits(1, 1),
    c_char: traits(1, 1),
    c_short: traits(2, 2),
    c_int: traits(4, 4),
    c_long: traits(4, 4),
    c_long_long: traits(8, 8),
    c_float: traits(4, 4),
    c_double: traits(8, 8),
    c_long_double: traits(8, 8),
    pointer: traits(4, 4),
    size_type: traits(4, 4),
    biggest_align: 4,
    long_max: 2147483647,
    intmax_max: 9223372036854775807,
    size_max: 4294967295,
    uintmax_max: 18446744073709551615,
    ptrdiff_max: 2147483647,
    intptr_max: 2147483647,
    uintptr_max: 4294967295,
    predefined: PREDEFINED_ARM32,
};

static ARM64: ArchDescriptor = ArchDescriptor {
    target: Architecture::Arm64,
    endianness: Endianness::Little,
    c_bool: traits(1, 1),
    c_char: traits(1, 1),
    c_short: traits(2, 2),
    c_int: traits(4, 4),
    c_long: traits(8, 8),
    c_long_long: traits(8, 8),
    c_float: traits(4, 4),
    c_double: traits(8, 8),
    c_long_double: traits(8, 8),
    pointer: traits(8, 8),
    size_type: traits(8, 8),
    biggest_align: 8,
    long_max: 9223372036854775807,
    intmax_max: 9223372036854775807,
    size_max: 18446744073709551615,
    uintmax_max: 18446744073709551615,
    ptrdiff_max: 9223372036854775807,
    intptr_max: 9223372036854775807,
    uintptr_max: 18446744073709551615,
    predefined: PREDEFINED_ARM64,
};

static I686: ArchDescriptor = ArchDescriptor {
    target: Architecture::I686,
    endianness: Endianness::Little,
    c_bool: traits(1, 1),
    c_char: traits(1, 1),
    c_short: traits(2, 2),
    c_int: traits(4, 4),
    c_long: traits(4, 4),
    // 8-byte scalars align to 4 on i386, unlike every other target here.
    c_long_long: traits(8, 4),
    c_float: traits(4, 4),
    c_double: traits(8, 4),
    c_long_double: traits(16, 16),
    pointer: traits(4, 4),
    size_type: traits(4, 4),
    biggest_align: 16,
    long_max: 2147483647,
    intmax_max: 9223372036854775807,
    size_max: 4294967295,
    uintmax_max: 18446744073709551615,
    ptrdiff_max: 2147483647,
    intptr_max: 2147483647,
    uintptr_max: 4294967295,
    predefined: PREDEFINED_I686,
};

static X86_64: ArchDescriptor = ArchDescriptor {
    target: Architecture::X86_64,
    endianness: Endianness::Little,
    c_bool: traits(1, 1),
    c_char: traits(1, 1),
    c_short: traits(2, 2),
    c_int: traits(4, 4),
    c_long: traits(8, 8),
    c_long_long: traits(8, 8),
    c_float: traits(4, 4),
    c_double: traits(8, 8),
    c_long_double: traits(16, 16),
    pointer: traits(8, 8),
    size_type: traits(8, 8),
    biggest_align: 16,
    long_max: 9223372036854775807,
    intmax_max: 9223372036854775807,
    size_max: 18446744073709551615,
    uintmax_max: 18446744073709551615,
    ptrdiff_max: 9223372036854775807,
    intptr_max: 9223372036854775807,
    uintptr_max: 18446744073709551615,
    predefined: PREDEFINED_X86_64,
};

static PREDEFINED_ARM32: &[(&str, &str)] = &[
    ("__USING_SJLJ_EXCEPTIONS__", "1"),
    ("_ILP32", "1"),
    ("__ILP32__", "1"),
    ("__LONG_MAX__", "2147483647L"),
    ("__INTMAX_MAX__", "9223372036854775807LL"),
    ("__SIZE_MAX__", "4294967295UL"),
    ("__UINTMAX_MAX__", "18446744073709551615ULL"),
    ("__PTRDIFF_MAX__", "2147483647"),
    ("__INTPTR_MAX__", "2147483647L"),
    ("__UINTPTR_MAX__", "4294967295UL"),
    ("__SIZEOF_LONG__", "4"),
    ("__SIZEOF_POINTER__", "4"),
    ("__SIZEOF_PTRDIFF_T__", "4"),
    ("__SIZEOF_SIZE_T__", "4"),
    ("__INTMAX_TYPE__", "long long int"),
    ("__INTMAX_C_SUFFIX__", "LL"),
    ("__UINTMAX_TYPE__", "long long unsigned int"),
    ("__UINTMAX_C_SUFFIX__", "ULL"),
    ("__PTRDIFF_TYPE__", "int"),
    ("__PTRDIFF_WIDTH__", "32"),
    ("__INTPTR_WIDTH__", "32"),
    ("__SIZE_WIDTH__", "32"),
    ("__UINTPTR_WIDTH__", "32"),
    ("__POINTER_WIDTH__", "32"),
    ("__BIGGEST_ALIGNMENT__", "4"),
    ("__INT_LEAST64_TYPE__", "long long int"),
    ("__INT_FAST64_TYPE__", "long long int"),
    ("__UINT_LEAST64_TYPE__", "long long unsigned int"),
    ("__UINT_FAST64_TYPE__", "long long unsigned int"),
    ("__ARMEL__", "1"),
    ("__arm", "1"),
    ("__arm__", "1"),
    ("__ARM_ARCH_4T__", "1"),
    ("__ARM_ARCH", "4"),
    ("__ARM_ARCH_ISA_ARM", "1"),
    ("__ARM_ARCH_ISA_THUMB", "1"),
    ("__ARM_32BIT_STATE", "1"),
    ("__SOFTFP__", "1"),
    ("__APCS_32__", "1"),
    ("__LITTLE_ENDIAN__", "1"),
];

static PREDEFINED_ARM64: &[(&str, &str)] = &[
    ("_LP64", "1"),
    ("__LP64__", "1"),
    ("__LONG_MAX__", "9223372036854775807L"),
    ("__INTMAX_MAX__", "9223372036854775807L"),
    ("__SIZE_MAX__", "18446744073709551615UL"),
    ("__UINTMAX_MAX__", "18446744073709551615UL"),
    ("__PTRDIFF_MAX__", "9223372036854775807L"),
    ("__INTPTR_MAX__", "9223372036854775807L"),
    ("__UINTPTR_MAX__", "18446744073709551615UL"),
    ("__SIZEOF_LONG__", "8"),
    ("__SIZEOF_POINTER__", "8"),
    ("__SIZEOF_PTRDIFF_T__", "8"),
    ("__SIZEOF_SIZE_T__", "8"),
    ("__INTMAX_TYPE__", "long int"),
    ("__INTMAX_C_SUFFIX__", "L"),
    ("__UINTMAX_TYPE__", "long unsigned int"),
    ("__UINTMAX_C_SUFFIX__", "UL"),
    ("__PTRDIFF_TYPE__", "long int"),
    ("__PTRDIFF_WIDTH__", "64"),
    ("__INTPTR_WIDTH__", "64"),
    ("__SIZE_WIDTH__", "64"),
    ("__UINTPTR_WIDTH__", "64"),
    ("__POINTER_WIDTH__", "64"),
    ("__BIGGEST_ALIGNMENT__", "8"),
    ("__INT_LEAST64_TYPE__", "long int"),
    ("__INT_FAST64_TYPE__", "long int"),
    ("__UINT_LEAST64_TYPE__", "long unsigned int"),
    ("__UINT_FAST64_TYPE__", "long unsigned int"),
    ("__AARCH64EL__", "1"),
    ("__aarch64__", "1"),
    ("__ARM_ARCH", "8"),
    ("__ARM_ARCH_PROFILE", "'A'"),
    ("__ARM_64BIT_STATE", "1"),
    ("__ARM_PCS_AAPCS64", "1"),
    ("__ARM_ARCH_ISA_A64", "1"),
    ("__ARM_NEON", "1"),
    ("__ARM_NEON__", "1"),
    ("__ARM_FEATURE_UNALIGNED", "1"),
    ("__AARCH64_SIMD__", "1"),
    ("__ARM64_ARCH_8__", "1"),
    ("__LITTLE_ENDIAN__", "1"),
    ("__arm64", "1"),
    ("__arm64__", "1"),
];

static PREDEFINED_I686: &[(&str, &str)] = &[
    ("_ILP32", "1"),
    ("__ILP32__", "1"),
    ("__LONG_MAX__", "2147483647L"),
    ("__INTMAX_MAX__", "9223372036854775807LL"),
    ("__SIZE_MAX__", "4294967295UL"),
    ("__UINTMAX_MAX__", "18446744073709551615ULL"),
    ("__PTRDIFF_MAX__", "2147483647"),
    ("__INTPTR_MAX__", "2147483647L"),
    ("__UINTPTR_MAX__", "4294967295UL"),
    ("__SIZEOF_LONG__", "4"),
    ("__SIZEOF_POINTER__", "4"),
    ("__SIZEOF_PTRDIFF_T__", "4"),
    ("__SIZEOF_SIZE_T__", "4"),
    ("__INTMAX_TYPE__", "long long int"),
    ("__INTMAX_C_SUFFIX__", "LL"),
    ("__UINTMAX_TYPE__", "long long unsigned int"),
    ("__UINTMAX_C_SUFFIX__", "ULL"),
    ("__PTRDIFF_TYPE__", "int"),
    ("__PTRDIFF_WIDTH__", "32"),
    ("__INTPTR_WIDTH__", "32"),
    ("__SIZE_WIDTH__", "32"),
    ("__UINTPTR_WIDTH__", "32"),
    ("__POINTER_WIDTH__", "32"),
    ("__BIGGEST_ALIGNMENT__", "16"),
    ("__i386", "1"),
    ("__i386__", "1"),
    ("i386", "1"),
    ("__LITTLE_ENDIAN__", "1"),
];

static PREDEFINED_X86_64: &[(&str, &str)] = &[
    ("_LP64", "1"),
    ("__LP64__", "1"),
    ("__LONG_MAX__", "9223372036854775807L"),
    ("__INTMAX_MAX__", "9223372036854775807L"),
    ("__SIZE_MAX__", "18446744073709551615UL"),
    ("__UINTMAX_MAX__", "18446744073709551615UL"),
    ("__PTRDIFF_MAX__", "9223372036854775807L"),
    ("__INTPTR_MAX__", "9223372036854775807L"),
    ("__UINTPTR_MAX__", "18446744073709551615UL"),
    ("__SIZEOF_LONG__", "8"),
    ("__SIZEOF_POINTER__", "8"),
    ("__SIZEOF_PTRDIFF_T__", "8"),
    ("__SIZEOF_SIZE_T__", "8"),
    ("__INTMAX_TYPE__", "long int"),
    ("__INTMAX_C_SUFFIX__", "L"),
    ("__UINTMAX_TYPE__", "long unsigned int"),
    ("__UINTMAX_C_SUFFIX__", "UL"),
    ("__PTRDIFF_TYPE__", "long int"),
    ("__PTRDIFF_WIDTH__", "64"),
    ("__INTPTR_WIDTH__", "64"),
    ("__SIZE_WIDTH__", "64"),
    ("__UINTPTR_WIDTH__", "64"),
    ("__POINTER_WIDTH__", "64"),
    ("__BIGGEST_ALIGNMENT__", "16"),
    ("__x86_64", "1"),
    ("__x86_64__", "1"),
    ("__amd64", "1"),
    ("__amd64__", "1"),
    ("__SSE__", "1"),
    ("__SSE2__", "1"),
    ("__LITTLE_ENDIAN__", "1"),
];
