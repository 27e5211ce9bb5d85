//! Rendering types in host notation (`[]int`, `map[string]*User`, ...).

use std::fmt;

use super::{ChanDir, Type, TypeId, TypeUniverse};

/// Display adapter returned by [`TypeUniverse::display`].
pub struct TypeDisplay<'a> {
    types: &'a TypeUniverse,
    id: TypeId,
}

impl TypeUniverse {
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { types: self, id }
    }

    pub fn type_string(&self, id: TypeId) -> String {
        self.display(id).to_string()
    }
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    types: &TypeUniverse,
    list: &[TypeId],
    variadic: bool,
) -> fmt::Result {
    for (i, t) in list.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match types.get(*t) {
            Type::Slice(elem) if variadic && i + 1 == list.len() => {
                write!(f, "...{}", types.display(*elem))?;
            }
            _ => write!(f, "{}", types.display(*t))?,
        }
    }
    Ok(())
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.types;
        match types.get(self.id) {
            Type::Invalid => f.write_str("invalid type"),
            Type::Basic(kind) => f.write_str(kind.name()),
            Type::Pointer(elem) => write!(f, "*{}", types.display(*elem)),
            Type::Slice(elem) => write!(f, "[]{}", types.display(*elem)),
            Type::Array { elem, len } => write!(f, "[{len}]{}", types.display(*elem)),
            Type::Map { key, value } => {
                write!(f, "map[{}]{}", types.display(*key), types.display(*value))
            }
            Type::Chan { elem, dir } => match dir {
                ChanDir::Both => write!(f, "chan {}", types.display(*elem)),
                ChanDir::Send => write!(f, "chan<- {}", types.display(*elem)),
                ChanDir::Recv => write!(f, "<-chan {}", types.display(*elem)),
            },
            Type::Signature(sig) => {
                f.write_str("func(")?;
                write_list(f, types, &sig.params, sig.variadic)?;
                f.write_str(")")?;
                match sig.results.as_slice() {
                    [] => Ok(()),
                    [one] => write!(f, " {}", types.display(*one)),
                    many => {
                        f.write_str(" (")?;
                        write_list(f, types, many, false)?;
                        f.write_str(")")
                    }
                }
            }
            Type::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", types.display(field.typ))?;
                    } else {
                        write!(f, "{} {}", field.name, types.display(field.typ))?;
                    }
                    if let Some(tag) = &field.tag {
                        write!(f, " {tag:?}")?;
                    }
                }
                f.write_str("}")
            }
            Type::Interface(methods) if methods.is_empty() => f.write_str("any"),
            Type::Interface(methods) => {
                f.write_str("interface{")?;
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    let sig = types.type_string(m.sig);
                    write!(f, "{}{}", m.name, sig.strip_prefix("func").unwrap_or(&sig))?;
                }
                f.write_str("}")
            }
            Type::Tuple(elems) => {
                f.write_str("(")?;
                write_list(f, types, elems, false)?;
                f.write_str(")")
            }
            Type::Named(named) => f.write_str(&named.name),
            Type::Ref(inner) => write!(f, "RefType{{{}}}", types.display(*inner)),
            Type::TypeOf(inner) => write!(f, "TypeType{{{}}}", types.display(*inner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Span;
    use crate::types::{Field, TypeUniverse};

    #[test]
    fn composite_rendering() {
        let mut u = TypeUniverse::new();
        let int = u.int();
        let string = u.string();
        let list = u.slice(int);
        let m = u.map(string, list);
        assert_eq!(u.type_string(m), "map[string][]int");
        let p = u.pointer(m);
        assert_eq!(u.type_string(p), "*map[string][]int");
        let arr = u.array(u.byte(), 4);
        assert_eq!(u.type_string(arr), "[4]uint8");
    }

    #[test]
    fn signature_rendering() {
        let mut u = TypeUniverse::new();
        let int = u.int();
        let any_list = u.slice(u.any());
        let variadic = u.signature(vec![u.string(), any_list], vec![], true);
        assert_eq!(u.type_string(variadic), "func(string, ...any)");
        let multi = u.signature(vec![int], vec![int, u.error()], false);
        assert_eq!(u.type_string(multi), "func(int) (int, error)");
    }

    #[test]
    fn named_and_meta() {
        let mut u = TypeUniverse::new();
        let user = u.new_named("main.User", Span::NONE).unwrap();
        let body = u.struct_of(vec![Field::new("id", u.int()).with_tag("db:\"id\"")]);
        u.set_underlying(user, body, Span::NONE).unwrap();
        assert_eq!(u.type_string(user), "main.User");
        assert_eq!(u.type_string(body), "struct{id int \"db:\\\"id\\\"\"}");
        let r = u.ref_of(user);
        assert_eq!(u.type_string(r), "RefType{main.User}");
    }
}
