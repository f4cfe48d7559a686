//! Integration tests for complete method construction flows.
//!
//! These tests exercise the builder the way a module writer drives it:
//! declare a method, shape its signature, append a body with locals, apply
//! attributes, finalize, and serialize the blobs the writer consumes.

use dotforge::prelude::*;

fn universe() -> TypeUniverse {
    TypeUniverse::new()
}

/// Build a complete static arithmetic method end to end: parameters, body,
/// locals, finalization, and both serialized blobs.
#[test]
fn test_static_method_full_flow() -> Result<()> {
    let universe = universe();
    let declaring = Token::new(0x0200_0001);

    let mut method = MethodDefBuilder::new(
        "Accumulate",
        declaring,
        MethodAttributes::PUBLIC | MethodAttributes::STATIC | MethodAttributes::HIDE_BY_SIG,
        CallingConventions::STANDARD,
        Some(TypeSignature::I4),
        Some(vec![TypeSignature::I4, TypeSignature::I4]),
        &universe,
    )?;

    method.define_parameter(1, ParamAttributes::IN, Some("seed"))?;
    method.define_parameter(2, ParamAttributes::IN, Some("step"))?;
    method.define_parameter(0, 0, None)?; // return value annotation

    {
        let body = method.request_body(32)?;
        body.begin_scope();
        let total = body.declare_local(TypeSignature::I4, false)?;
        body.name_local(total, "total")?;
        body.emit(&[0x02, 0x03, 0x58]); // ldarg.0 ldarg.1 add
        body.emit(&[0x0A, 0x06, 0x2A]); // stloc.0 ldloc.0 ret
        body.end_scope()?;
    }

    let token = method.finalize(Token::new(0x0600_0010));
    assert_eq!(token.table(), 0x06);

    // Signature blob: default calling convention, two int parameters
    let signature = method.signature_blob()?;
    assert_eq!(signature, vec![0x00, 0x02, 0x08, 0x08, 0x08]);

    // Local signature blob: one int local
    let body = method.body().expect("body was requested");
    assert_eq!(body.local_signature_blob()?, vec![0x07, 0x01, 0x08]);

    let local = body.local(0).expect("local 0 exists");
    assert_eq!(local.name(), Some("total"));
    assert_eq!(local.start_offset(), 0);
    assert_eq!(local.end_offset(), 6);

    Ok(())
}

/// Generic instance method: set-once generic parameters flow into the
/// encoded signature's arity and the GENERIC calling-convention bit.
#[test]
fn test_generic_instance_method_flow() -> Result<()> {
    let universe = universe();

    let mut method = MethodDefBuilder::new(
        "Choose",
        Token::new(0x0200_0002),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        CallingConventions::HAS_THIS,
        Some(TypeSignature::GenericParamMethod(0)),
        Some(vec![
            TypeSignature::GenericParamMethod(0),
            TypeSignature::GenericParamMethod(1),
            TypeSignature::Boolean,
        ]),
        &universe,
    )?;

    let defined = method.define_generic_parameters(&["TFirst", "TSecond"])?;
    assert_eq!(defined.len(), 2);

    // Redefinition always fails, the original assignment survives
    assert!(method.define_generic_parameters(&["TOther"]).is_err());
    assert_eq!(method.generic_arguments()[0].name(), "TFirst");
    assert_eq!(method.generic_arguments()[1].position(), 1);

    let blob = method.signature_blob()?;
    let decoded = parse_method_signature(&blob)?;
    assert!(decoded.has_this);
    assert_eq!(decoded.param_count_generic, 2);
    assert_eq!(decoded.params.len(), 3);

    Ok(())
}

/// P/Invoke flow: the foreign-import attribute shapes the descriptor and
/// permanently rules out a bytecode body.
#[test]
fn test_pinvoke_method_flow() -> Result<()> {
    let universe = universe();

    let mut method = MethodDefBuilder::new(
        "MessageBox",
        Token::new(0x0200_0003),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC,
        CallingConventions::STANDARD,
        Some(TypeSignature::I4),
        Some(vec![
            TypeSignature::I,
            TypeSignature::String,
            TypeSignature::String,
            TypeSignature::U4,
        ]),
        &universe,
    )?;

    // [DllImport("user32", EntryPoint = "MessageBoxW", CharSet = CharSet.Unicode)]
    let mut blob = vec![0x01, 0x00];
    blob.push(6);
    blob.extend_from_slice(b"user32");
    blob.extend_from_slice(&2u16.to_le_bytes());
    blob.push(0x54); // PROPERTY
    blob.push(0x0E); // STRING
    blob.push(10);
    blob.extend_from_slice(b"EntryPoint");
    blob.push(11);
    blob.extend_from_slice(b"MessageBoxW");
    blob.push(0x54); // PROPERTY
    blob.push(0x55); // ENUM
    let charset = "System.Runtime.InteropServices.CharSet";
    blob.push(charset.len() as u8);
    blob.extend_from_slice(charset.as_bytes());
    blob.push(7);
    blob.extend_from_slice(b"CharSet");
    blob.extend_from_slice(&3i32.to_le_bytes());

    let ctor = CustomAttributeCtor::new(
        Token::new(0x0A00_0004),
        "System.Runtime.InteropServices.DllImportAttribute",
        vec![TypeSignature::String],
    );
    method.apply_custom_attribute(&ctor, &blob)?;

    assert!(method.attributes().contains(MethodAttributes::PINVOKE_IMPL));
    let data = method.pinvoke_data().expect("import data decoded");
    assert_eq!(data.module_name(), "user32");
    assert_eq!(data.entry_point(), Some("MessageBoxW"));
    assert_eq!(
        data.flags() & PInvokeAttributes::CHAR_SET_MASK,
        PInvokeAttributes::CHAR_SET_UNICODE
    );

    // No bytecode body, ever
    assert!(method.request_body(0).is_err());

    // The signature surface is unaffected by the import
    let decoded = parse_method_signature(&method.signature_blob()?)?;
    assert_eq!(decoded.params.len(), 4);

    Ok(())
}

/// Declared class types flow through the universe into encoded signatures
/// and decode back to the same token.
#[test]
fn test_declared_types_round_trip_through_signature() -> Result<()> {
    let mut universe = universe();
    let customer = universe.class("MyApp.Models.Customer");

    let method = MethodDefBuilder::new(
        "Load",
        Token::new(0x0200_0004),
        MethodAttributes::ASSEM | MethodAttributes::STATIC,
        CallingConventions::STANDARD,
        Some(customer.clone()),
        Some(vec![TypeSignature::I4]),
        &universe,
    )?;

    let decoded = parse_method_signature(&method.signature_blob()?)?;
    assert_eq!(decoded.return_type.base, customer);

    Ok(())
}

/// The body stream keeps one allocation state across repeated requests, and
/// slot indices stay gapless when declarations interleave with emission.
#[test]
fn test_body_stream_is_shared_across_requests() -> Result<()> {
    let universe = universe();
    let mut method = MethodDefBuilder::new(
        "Worker",
        Token::new(0x0200_0005),
        MethodAttributes::PRIVATE | MethodAttributes::STATIC,
        CallingConventions::STANDARD,
        None,
        None,
        &universe,
    )?;

    let first = method.request_body(64)?;
    let a = first.declare_local(TypeSignature::I4, false)?;
    first.emit(&[0x00]);

    let second = method.request_body(0)?;
    let b = second.declare_local(TypeSignature::String, false)?;
    second.emit(&[0x00, 0x00]);
    let c = second.declare_local(TypeSignature::Object, true)?;

    assert_eq!((a, b, c), (0, 1, 2));
    assert_eq!(method.body().map(MethodBodyStream::local_count), Some(3));
    assert_eq!(method.body().map(MethodBodyStream::offset), Some(3));

    Ok(())
}

/// Attribute dispatch runs in declared order and unmatched attributes are
/// preserved byte-exact alongside the special-cased security attribute.
#[test]
fn test_attribute_storage_order() -> Result<()> {
    let universe = universe();
    let mut method = MethodDefBuilder::new(
        "Guarded",
        Token::new(0x0200_0006),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC,
        CallingConventions::STANDARD,
        None,
        None,
        &universe,
    )?;

    let marker_blob = [0x01, 0x00, 0x00, 0x00];
    method.apply_custom_attribute(
        &CustomAttributeCtor::new(Token::new(0x0A00_0005), "MyApp.MarkerAttribute", Vec::new()),
        &marker_blob,
    )?;
    method.apply_custom_attribute(
        &CustomAttributeCtor::new(
            Token::new(0x0A00_0006),
            "System.Security.SuppressUnmanagedCodeSecurityAttribute",
            Vec::new(),
        ),
        &marker_blob,
    )?;

    assert!(method.attributes().contains(MethodAttributes::HAS_SECURITY));
    let stored = method.custom_attributes();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].ctor.declaring_type, "MyApp.MarkerAttribute");
    assert_eq!(
        stored[1].ctor.declaring_type,
        "System.Security.SuppressUnmanagedCodeSecurityAttribute"
    );

    Ok(())
}
