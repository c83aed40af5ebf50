//! Class-file descriptor and generic signature decoder
//!
//! Decodes JVM field descriptors (`Ljava/lang/String;`), method descriptors
//! (`(I[J)V`) and generic signatures (`<T:Ljava/lang/Object;>(TT;)TT;`) into a
//! small AST. Plain descriptors are a subset of the signature grammar, so one
//! recursive-descent parser handles both.

use crate::binding::BaseType;
use crate::error::SignatureError;
use crate::names::CompoundName;

/// A type in a descriptor or signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSig {
    /// Primitive or `V`
    Base(BaseType),
    /// `Lpkg/Name<...>.Inner<...>;`
    Class(ClassTypeSig),
    /// `TName;`
    TypeVariable(String),
    /// `[component`
    Array(Box<TypeSig>),
}

/// Class type signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSig {
    /// Internal name of the outermost class (`java/util/Map`)
    pub name: String,
    /// Arguments of the outermost class
    pub arguments: Vec<TypeArgSig>,
    /// `.Inner<...>` suffixes, outermost first
    pub inner: Vec<InnerClassSig>,
}

impl ClassTypeSig {
    /// Internal binary name of the innermost class (`java/util/Map$Entry`)
    pub fn binary_name(&self) -> String {
        let mut name = self.name.clone();
        for inner in &self.inner {
            name.push('$');
            name.push_str(&inner.name);
        }
        name
    }

    /// Compound name of the innermost class
    pub fn compound_name(&self) -> CompoundName {
        CompoundName::from_internal(&self.binary_name())
    }
}

/// `.Inner<...>` segment of a class type signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassSig {
    /// Simple name of the inner class
    pub name: String,
    /// Its type arguments
    pub arguments: Vec<TypeArgSig>,
}

/// Type argument in a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgSig {
    /// `*`
    Unbound,
    /// `+Bound`
    Extends(TypeSig),
    /// `-Bound`
    Super(TypeSig),
    /// Plain argument
    Exact(TypeSig),
}

/// `Name:ClassBound:InterfaceBound...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameterSig {
    /// Declared name
    pub name: String,
    /// Class bound, absent when only interface bounds are given
    pub class_bound: Option<TypeSig>,
    /// Interface bounds
    pub interface_bounds: Vec<TypeSig>,
}

impl TypeParameterSig {
    /// All bounds in declaration order
    pub fn bounds(&self) -> impl Iterator<Item = &TypeSig> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

/// Generic class signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    /// Declared type parameters
    pub type_parameters: Vec<TypeParameterSig>,
    /// Superclass
    pub superclass: TypeSig,
    /// Superinterfaces
    pub interfaces: Vec<TypeSig>,
}

/// Method descriptor or generic method signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Declared type parameters
    pub type_parameters: Vec<TypeParameterSig>,
    /// Parameter types
    pub parameters: Vec<TypeSig>,
    /// Return type
    pub return_type: TypeSig,
    /// `^` thrown types
    pub exceptions: Vec<TypeSig>,
}

/// Decode a field descriptor or field signature
pub fn parse_field_signature(signature: &str) -> Result<TypeSig, SignatureError> {
    let mut parser = SignatureParser::new(signature);
    let ty = parser.type_signature()?;
    parser.finish()?;
    Ok(ty)
}

/// Decode a method descriptor or generic method signature
pub fn parse_method_signature(signature: &str) -> Result<MethodSignature, SignatureError> {
    let mut parser = SignatureParser::new(signature);
    let type_parameters = parser.formal_type_parameters()?;
    parser.expect('(')?;
    let mut parameters = Vec::new();
    while parser.peek()? != ')' {
        parameters.push(parser.type_signature()?);
    }
    parser.expect(')')?;
    let return_type = parser.type_signature()?;
    let mut exceptions = Vec::new();
    while parser.at('^') {
        parser.bump();
        exceptions.push(parser.type_signature()?);
    }
    parser.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        exceptions,
    })
}

/// Decode a generic class signature
pub fn parse_class_signature(signature: &str) -> Result<ClassSignature, SignatureError> {
    let mut parser = SignatureParser::new(signature);
    let type_parameters = parser.formal_type_parameters()?;
    let superclass = parser.type_signature()?;
    let mut interfaces = Vec::new();
    while !parser.is_at_end() {
        interfaces.push(parser.type_signature()?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

struct SignatureParser<'a> {
    signature: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(signature: &'a str) -> Self {
        SignatureParser {
            signature,
            bytes: signature.as_bytes(),
            pos: 0,
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn at(&self, c: char) -> bool {
        self.bytes.get(self.pos).map(|b| *b as char) == Some(c)
    }

    fn peek(&self) -> Result<char, SignatureError> {
        self.bytes
            .get(self.pos)
            .map(|b| *b as char)
            .ok_or_else(|| self.unexpected_end())
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Result<char, SignatureError> {
        let c = self.peek()?;
        self.bump();
        Ok(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), SignatureError> {
        let offset = self.pos;
        let found = self.next()?;
        if found != expected {
            return Err(self.unexpected(found, offset));
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), SignatureError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(SignatureError::TrailingCharacters {
                signature: self.signature.to_string(),
                offset: self.pos,
            })
        }
    }

    fn unexpected_end(&self) -> SignatureError {
        SignatureError::UnexpectedEnd {
            signature: self.signature.to_string(),
        }
    }

    fn unexpected(&self, found: char, offset: usize) -> SignatureError {
        SignatureError::UnexpectedChar {
            signature: self.signature.to_string(),
            found,
            offset,
        }
    }

    fn identifier(&mut self) -> Result<String, SignatureError> {
        let start = self.pos;
        while let Some(b) = self.bytes.get(self.pos) {
            if matches!(*b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            let found = self.peek()?;
            return Err(self.unexpected(found, start));
        }
        Ok(self.signature[start..self.pos].to_string())
    }

    fn formal_type_parameters(&mut self) -> Result<Vec<TypeParameterSig>, SignatureError> {
        let mut parameters = Vec::new();
        if !self.at('<') {
            return Ok(parameters);
        }
        self.bump();
        while self.peek()? != '>' {
            let name = self.identifier()?;
            self.expect(':')?;
            let class_bound = match self.peek()? {
                ':' => None,
                _ => Some(self.type_signature()?),
            };
            let mut interface_bounds = Vec::new();
            while self.at(':') {
                self.bump();
                interface_bounds.push(self.type_signature()?);
            }
            parameters.push(TypeParameterSig {
                name,
                class_bound,
                interface_bounds,
            });
        }
        self.expect('>')?;
        Ok(parameters)
    }

    fn type_signature(&mut self) -> Result<TypeSig, SignatureError> {
        let offset = self.pos;
        let c = self.next()?;
        match c {
            'L' => self.class_type_signature().map(TypeSig::Class),
            'T' => {
                let name = self.identifier()?;
                self.expect(';')?;
                Ok(TypeSig::TypeVariable(name))
            }
            '[' => Ok(TypeSig::Array(Box::new(self.type_signature()?))),
            other => BaseType::from_descriptor(other)
                .map(TypeSig::Base)
                .ok_or_else(|| self.unexpected(other, offset)),
        }
    }

    // 'L' already consumed
    fn class_type_signature(&mut self) -> Result<ClassTypeSig, SignatureError> {
        let mut name = self.identifier()?;
        while self.at('/') {
            self.bump();
            name.push('/');
            name.push_str(&self.identifier()?);
        }
        let arguments = self.type_arguments()?;
        let mut inner = Vec::new();
        while self.at('.') {
            self.bump();
            let name = self.identifier()?;
            let arguments = self.type_arguments()?;
            inner.push(InnerClassSig { name, arguments });
        }
        self.expect(';')?;
        Ok(ClassTypeSig { name, arguments, inner })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgSig>, SignatureError> {
        let mut arguments = Vec::new();
        if !self.at('<') {
            return Ok(arguments);
        }
        self.bump();
        while self.peek()? != '>' {
            let argument = match self.peek()? {
                '*' => {
                    self.bump();
                    TypeArgSig::Unbound
                }
                '+' => {
                    self.bump();
                    TypeArgSig::Extends(self.type_signature()?)
                }
                '-' => {
                    self.bump();
                    TypeArgSig::Super(self.type_signature()?)
                }
                _ => TypeArgSig::Exact(self.type_signature()?),
            };
            arguments.push(argument);
        }
        self.expect('>')?;
        if arguments.is_empty() {
            return Err(self.unexpected('>', self.pos - 1));
        }
        Ok(arguments)
    }
}
