use ilvm::{Fault, IlMachine, MethodFlags, MethodHeader, MethodToken};

fn header(reference: u8, token: MethodToken, num_args: u8, code_length: usize) -> MethodHeader {
  MethodHeader {
    reference,
    flags: MethodFlags::STATIC,
    code_length: code_length as u16,
    max_locals: 2,
    max_stack: 10,
    num_args,
    token,
  }
}

fn main() {

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let mut machine = IlMachine::new();

  // The device self-test program:
  //   nop, ldarg.0, ldarg.1, add, stloc.0, br.s +0, ldloc.0, ret
  let code = vec![0x00, 0x02, 0x03, 0x58, 0x0A, 0x2B, 0x00, 0x06, 0x2A];
  let length = code.len();
  if let Err(error) = machine.load(header(0, 0x0600_0001, 2, length), code) {
    eprintln!("{}", error);
    return;
  }

  // A two-method program exercising the frame chain: the entry method
  // forwards its arguments to the adder through a call token.
  let adder = vec![0x02, 0x03, 0x58, 0x2A];
  let entry = vec![0x02, 0x03, 0x28, 0x02, 0x00, 0x00, 0x06, 0x2A];
  let loaded = machine
    .load(header(1, 0x0600_0002, 2, adder.len()), adder)
    .and_then(|_| machine.load(header(2, 0x0600_0003, 2, entry.len()), entry));
  if let Err(error) = loaded {
    eprintln!("{}", error);
    return;
  }

  println!("{}", machine);

  match machine.execute(0, &[255, 7]) {
    Ok(result) => println!("Self test returned: {}", result),
    Err(fault) => println!("Self test faulted: {}", fault),
  }

  match machine.execute(2, &[200, 62]) {
    Ok(result) => println!("Nested call returned: {}", result),
    Err(fault) => println!("Nested call faulted: {}", fault),
  }

  // A deliberate fault: returning with nothing on the operand stack.
  let broken = vec![0x2A];
  if machine.load(header(3, 0x0600_0004, 0, broken.len()), broken).is_ok() {
    match machine.execute(3, &[]) {
      Ok(result) => println!("Broken method returned: {}", result),
      Err(fault @ Fault::OperandStackFault { .. }) => {
        println!("Broken method faulted as expected: {}", fault)
      }
      Err(fault) => println!("Broken method faulted: {}", fault),
    }
  }

  machine.reset();
  println!("After reset:\n{}", machine);
}
