//! Referenced assemblies declared before any source is bound

use super::{Compilation, TypeId, TypeRef, TypeSymbol, BCL_ASSEMBLY};
use crate::config::{Config, MarkerTriple};
use crate::syntax::DeclarationKind;

/// Ids of types the binder and fact extraction refer to directly
#[derive(Debug, Clone, Default)]
pub struct WellKnown {
    pub object: TypeId,
    pub value_type: TypeId,
    pub enum_: TypeId,
    pub attribute: TypeId,
    pub icomparable: TypeId,
    pub icomparable_t: TypeId,
    pub iequatable_t: TypeId,
    pub value_object: TypeId,
    pub value_object_t: TypeId,
    pub smart_enum: TypeId,
    pub smart_enum_t: TypeId,
    pub value_object_attribute: TypeId,
    pub smart_enum_attribute: TypeId,
}

/// Structs with full ordering and equality: `IComparable`, `IComparable<T>`, `IEquatable<T>`
const ORDERED_STRUCTS: &[&str] = &[
    "Boolean", "Byte", "SByte", "Char", "Int16", "UInt16", "Int32", "UInt32", "Int64", "UInt64",
    "IntPtr", "UIntPtr", "Single", "Double", "Decimal", "Guid", "DateTime", "DateTimeOffset",
    "TimeSpan", "DateOnly", "TimeOnly",
];

struct Declarer<'c> {
    compilation: &'c mut Compilation,
}

impl Declarer<'_> {
    fn add(
        &mut self,
        assembly: &str,
        namespace: &str,
        name: &str,
        kind: DeclarationKind,
        type_parameters: &[&str],
    ) -> TypeId {
        if let Some(id) = self.compilation.lookup(namespace, name, type_parameters.len()) {
            return id;
        }
        let mut symbol = TypeSymbol::new(name, Some(namespace), assembly, kind);
        symbol.type_parameters = type_parameters.iter().map(|p| p.to_string()).collect();
        symbol.constraints = vec![Vec::new(); type_parameters.len()];
        self.compilation.add_symbol(symbol)
    }

    fn bcl(&mut self, namespace: &str, name: &str, kind: DeclarationKind, params: &[&str]) -> TypeId {
        self.add(BCL_ASSEMBLY, namespace, name, kind, params)
    }

    fn set_base(&mut self, id: TypeId, base: TypeRef) {
        self.compilation.symbols[id].base_type = Some(base);
    }

    fn implement(&mut self, id: TypeId, interfaces: Vec<TypeRef>) {
        self.compilation.symbols[id].interfaces.extend(interfaces);
    }

    fn constrain(&mut self, id: TypeId, ordinal: usize, constraint: TypeRef) {
        self.compilation.symbols[id].constraints[ordinal].push(constraint);
    }

    fn make_abstract(&mut self, id: TypeId) {
        self.compilation.symbols[id].is_abstract = true;
    }
}

fn param(owner: TypeId, ordinal: usize) -> TypeRef {
    TypeRef::Parameter { owner, ordinal }
}

pub(super) fn declare(compilation: &mut Compilation, config: &Config) -> WellKnown {
    use DeclarationKind::*;

    let mut d = Declarer { compilation };

    let object = d.bcl("System", "Object", Class, &[]);
    let value_type = d.bcl("System", "ValueType", Class, &[]);
    let enum_ = d.bcl("System", "Enum", Class, &[]);
    let attribute = d.bcl("System", "Attribute", Class, &[]);
    let string = d.bcl("System", "String", Class, &[]);
    let icomparable = d.bcl("System", "IComparable", Interface, &[]);
    let icomparable_t = d.bcl("System", "IComparable", Interface, &["T"]);
    let iequatable_t = d.bcl("System", "IEquatable", Interface, &["T"]);

    d.set_base(value_type, TypeRef::named(object));
    d.set_base(enum_, TypeRef::named(value_type));
    d.implement(enum_, vec![TypeRef::named(icomparable)]);
    d.set_base(attribute, TypeRef::named(object));
    d.set_base(string, TypeRef::named(object));

    let ordered = |id: TypeId| {
        vec![
            TypeRef::named(icomparable),
            TypeRef::generic(icomparable_t, vec![TypeRef::named(id)]),
            TypeRef::generic(iequatable_t, vec![TypeRef::named(id)]),
        ]
    };
    d.implement(string, ordered(string));

    for name in ORDERED_STRUCTS {
        let id = d.bcl("System", name, Struct, &[]);
        d.set_base(id, TypeRef::named(value_type));
        d.implement(id, ordered(id));
    }

    let uri = d.bcl("System", "Uri", Class, &[]);
    d.set_base(uri, TypeRef::named(object));

    // Collections: enough to bind common parameter types, none of them equatable
    let ienumerable_t = d.bcl("System.Collections.Generic", "IEnumerable", Interface, &["T"]);
    let ireadonly_list_t = d.bcl("System.Collections.Generic", "IReadOnlyList", Interface, &["T"]);
    d.implement(
        ireadonly_list_t,
        vec![TypeRef::generic(ienumerable_t, vec![param(ireadonly_list_t, 0)])],
    );
    let list_t = d.bcl("System.Collections.Generic", "List", Class, &["T"]);
    d.set_base(list_t, TypeRef::named(object));
    d.implement(list_t, vec![TypeRef::generic(ireadonly_list_t, vec![param(list_t, 0)])]);
    let dictionary = d.bcl("System.Collections.Generic", "Dictionary", Class, &["TKey", "TValue"]);
    d.set_base(dictionary, TypeRef::named(object));
    d.bcl("System.Collections.Generic", "IEqualityComparer", Interface, &["T"]);

    let immutable_list = d.add(
        "System.Collections.Immutable",
        "System.Collections.Immutable",
        "ImmutableList",
        Class,
        &["T"],
    );
    d.set_base(immutable_list, TypeRef::named(object));
    d.implement(
        immutable_list,
        vec![TypeRef::generic(ireadonly_list_t, vec![param(immutable_list, 0)])],
    );
    let immutable_array = d.add(
        "System.Collections.Immutable",
        "System.Collections.Immutable",
        "ImmutableArray",
        Struct,
        &["T"],
    );
    d.set_base(immutable_array, TypeRef::named(value_type));
    d.implement(
        immutable_array,
        vec![
            TypeRef::generic(ireadonly_list_t, vec![param(immutable_array, 0)]),
            TypeRef::generic(
                iequatable_t,
                vec![TypeRef::generic(immutable_array, vec![param(immutable_array, 0)])],
            ),
        ],
    );

    // SeedWork runtime
    let runtime_assembly = config.runtime.assembly.as_str();
    let runtime_ns = config.runtime.namespace.as_str();

    let value_object = d.add(runtime_assembly, runtime_ns, "ValueObject", Record, &[]);
    d.make_abstract(value_object);
    d.set_base(value_object, TypeRef::named(object));
    d.implement(
        value_object,
        vec![TypeRef::generic(iequatable_t, vec![TypeRef::named(value_object)])],
    );

    let value_object_t = d.add(runtime_assembly, runtime_ns, "ValueObject", Record, &["TValueObject"]);
    d.make_abstract(value_object_t);
    d.set_base(value_object_t, TypeRef::named(value_object));
    let self_vo = TypeRef::generic(value_object_t, vec![param(value_object_t, 0)]);
    d.implement(value_object_t, vec![TypeRef::generic(iequatable_t, vec![self_vo.clone()])]);
    d.constrain(value_object_t, 0, self_vo);

    let smart_enum = d.add(runtime_assembly, runtime_ns, "SmartEnum", Record, &[]);
    d.make_abstract(smart_enum);
    d.set_base(smart_enum, TypeRef::named(object));
    d.implement(
        smart_enum,
        vec![TypeRef::generic(iequatable_t, vec![TypeRef::named(smart_enum)])],
    );

    let smart_enum_t = d.add(runtime_assembly, runtime_ns, "SmartEnum", Record, &["TKey"]);
    d.make_abstract(smart_enum_t);
    d.set_base(smart_enum_t, TypeRef::named(smart_enum));
    d.implement(
        smart_enum_t,
        vec![TypeRef::generic(
            iequatable_t,
            vec![TypeRef::generic(smart_enum_t, vec![param(smart_enum_t, 0)])],
        )],
    );
    d.constrain(
        smart_enum_t,
        0,
        TypeRef::generic(iequatable_t, vec![param(smart_enum_t, 0)]),
    );

    let mut marker = |triple: MarkerTriple| {
        let id = d.add(&triple.assembly, &triple.namespace, &triple.name, Class, &[]);
        d.set_base(id, TypeRef::named(attribute));
        d.compilation.symbols[id].is_sealed = true;
        id
    };
    let value_object_attribute = marker(config.value_object_marker());
    let smart_enum_attribute = marker(config.smart_enum_marker());

    WellKnown {
        object,
        value_type,
        enum_,
        attribute,
        icomparable,
        icomparable_t,
        iequatable_t,
        value_object,
        value_object_t,
        smart_enum,
        smart_enum_t,
        value_object_attribute,
        smart_enum_attribute,
    }
}
