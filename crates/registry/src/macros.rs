//! Component definition macros.
//!
//! Every macro expands to a plain static table entry whose fn pointers downcast
//! the erased value back to the declaring type.

/// Defines a component's static table and implements [`Component`](crate::Component).
///
/// ```ignore
/// component! {
///     pub static GIT: GitComponent = {
///         name: "git",
///         description: "Git helpers.\nTags and versions derived from the work tree.",
///         create: |_| GitComponent::default(),
///         attributes: [attribute!(GitComponent, tag_prefix: String, "Prefix of release tags.")],
///         operations: [operation!(GitComponent, tag, "Tags the current commit.")],
///     }
/// }
/// ```
#[macro_export]
macro_rules! component {
	($vis:vis static $def:ident : $ty:ident = {
		name: $name:literal,
		description: $desc:expr,
		create: $create:expr
		$(, attributes: [$($attr:expr),* $(,)?])?
		$(, operations: [$($op:expr),* $(,)?])?
		$(, requires: [$($req:expr),* $(,)?])?
		$(, injects: [$($inject:expr),* $(,)?])?
		$(, pre_inits: [$($pre:expr),* $(,)?])?
		$(, post_inits: [$($post:expr),* $(,)?])?
		$(, init: $init:expr)?
		$(,)?
	}) => {
		$vis static $def: $crate::ComponentDef = $crate::ComponentDef {
			name: $name,
			type_name: stringify!($ty),
			type_path: concat!(module_path!(), "::", stringify!($ty)),
			description: $desc,
			create: |scope| $crate::boxed::<$ty>(($create)(scope)),
			attributes: &[$($($attr),*)?],
			operations: &[$($($op),*)?],
			requires: &[$($($req),*)?],
			injects: &[$($($inject),*)?],
			pre_inits: &[$($($pre),*)?],
			post_inits: &[$($($post),*)?],
			init: $crate::__component_init!($ty $(, $init)?),
		};

		impl $crate::Component for $ty {
			fn def() -> &'static $crate::ComponentDef {
				&$def
			}
		}
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __component_init {
	($ty:ty) => {
		None
	};
	($ty:ty, $init:expr) => {
		Some(
			(|target: &mut dyn ::std::any::Any, scope: &dyn $crate::Scope| -> $crate::__private::anyhow::Result<()> {
				let component = $crate::downcast_mut::<$ty>(target).map_err($crate::__private::anyhow::Error::msg)?;
				($init)(component, scope)
			}) as $crate::InitFn,
		)
	};
}

/// Submits component definitions to the process-wide inventory.
#[macro_export]
macro_rules! register_component {
	($($def:path),* $(,)?) => {
		$($crate::__private::inventory::submit!($crate::ComponentReg(&$def));)*
	};
}

/// Declares a terminal attribute backed by a field implementing
/// [`AttributeValue`](crate::AttributeValue).
#[macro_export]
macro_rules! attribute {
	($owner:ty, $field:ident : $vty:ty, $doc:expr) => {
		$crate::AttributeDef {
			name: stringify!($field),
			doc: $doc,
			value_type: stringify!($vty),
			flags: $crate::AttributeFlags::CONFIGURABLE,
			level: 0,
			binding: None,
			kind: $crate::AttributeKind::Value {
				set: |target, raw| {
					let value = <$vty as $crate::AttributeValue>::from_raw(raw)?;
					$crate::downcast_mut::<$owner>(target)?.$field = value;
					Ok(())
				},
				get: |target| {
					target
						.downcast_ref::<$owner>()
						.and_then(|owner| $crate::AttributeValue::render_attr(&owner.$field))
				},
			},
		}
	};
}

/// Declares a nested attribute whose fields are configured with dotted names.
///
/// An `Option<T>` field must be populated by the owner before configuration;
/// assigning into an absent one fails.
#[macro_export]
macro_rules! nested {
	($owner:ty, $field:ident : Option<$sty:ty> => $def:path, $doc:expr) => {
		$crate::AttributeDef {
			name: stringify!($field),
			doc: $doc,
			value_type: stringify!($sty),
			flags: $crate::AttributeFlags::CONFIGURABLE,
			level: 0,
			binding: None,
			kind: $crate::AttributeKind::Nested {
				def: &$def,
				get: |target| {
					target
						.downcast_ref::<$owner>()
						.and_then(|owner| owner.$field.as_ref())
						.map(|value| value as &dyn ::std::any::Any)
				},
				get_mut: |target| {
					target
						.downcast_mut::<$owner>()
						.and_then(|owner| owner.$field.as_mut())
						.map(|value| value as &mut dyn ::std::any::Any)
				},
			},
		}
	};
	($owner:ty, $field:ident : $sty:ty => $def:path, $doc:expr) => {
		$crate::AttributeDef {
			name: stringify!($field),
			doc: $doc,
			value_type: stringify!($sty),
			flags: $crate::AttributeFlags::CONFIGURABLE,
			level: 0,
			binding: None,
			kind: $crate::AttributeKind::Nested {
				def: &$def,
				get: |target| {
					target
						.downcast_ref::<$owner>()
						.map(|owner| &owner.$field as &dyn ::std::any::Any)
				},
				get_mut: |target| {
					target
						.downcast_mut::<$owner>()
						.map(|owner| &mut owner.$field as &mut dyn ::std::any::Any)
				},
			},
		}
	};
}

/// Declares a [`MultiValueMap`](anvil_primitives::MultiValueMap) attribute.
///
/// `field: T` holds terminal values addressed as `field.<key>`; `field: struct T => DEF`
/// holds sub-objects addressed as `field.<key>.<attr>`.
#[macro_export]
macro_rules! multi_value {
	($owner:ty, $field:ident : struct $ety:ty => $def:path, $doc:expr) => {
		$crate::AttributeDef {
			name: stringify!($field),
			doc: $doc,
			value_type: concat!("MultiValueMap<", stringify!($ety), ">"),
			flags: $crate::AttributeFlags::CONFIGURABLE,
			level: 0,
			binding: None,
			kind: $crate::AttributeKind::MultiValue {
				element: Some($crate::ElementDef::Struct {
					def: &$def,
					entry_mut: |target, key| {
						target
							.downcast_mut::<$owner>()
							.map(|owner| owner.$field.entry_mut(key) as &mut dyn ::std::any::Any)
					},
				}),
			},
		}
	};
	($owner:ty, $field:ident : $ety:ty, $doc:expr) => {
		$crate::AttributeDef {
			name: stringify!($field),
			doc: $doc,
			value_type: concat!("MultiValueMap<", stringify!($ety), ">"),
			flags: $crate::AttributeFlags::CONFIGURABLE,
			level: 0,
			binding: None,
			kind: $crate::AttributeKind::MultiValue {
				element: Some($crate::ElementDef::Value {
					value_type: stringify!($ety),
					put: |target, key, raw| {
						let value = <$ety as $crate::AttributeValue>::from_raw(raw)?;
						$crate::downcast_mut::<$owner>(target)?.$field.put(key, value);
						Ok(())
					},
				}),
			},
		}
	};
}

/// Declares an operation backed by `fn(&mut Owner, &dyn Scope) -> anyhow::Result<()>`.
#[macro_export]
macro_rules! operation {
	($owner:ty, $method:ident, $doc:expr) => {
		$crate::OperationDef {
			name: stringify!($method),
			doc: $doc,
			level: 0,
			hidden: false,
			run: |target, scope| {
				let owner = $crate::downcast_mut::<$owner>(target).map_err($crate::__private::anyhow::Error::msg)?;
				<$owner>::$method(owner, scope)
			},
		}
	};
}

/// Declares a field of type `Option<Handle<T>>` filled with the live `T`.
#[macro_export]
macro_rules! inject {
	($owner:ty, $field:ident => $target:path) => {
		$crate::InjectDef {
			name: stringify!($field),
			target: &$target,
			set: |target, instance| {
				let handle = instance
					.downcast()
					.ok_or_else(|| format!("'{}' does not hold the injected type", instance.key()))?;
				$crate::downcast_mut::<$owner>(target)?.$field = Some(handle);
				Ok(())
			},
		}
	};
}

/// Declares a pre-initializer configuring `$target` right after its creation.
#[macro_export]
macro_rules! pre_init {
	($target:path : $ty:ty, $apply:expr) => {
		$crate::PreInitDef {
			target: &$target,
			apply: |target| {
				let target = $crate::downcast_mut::<$ty>(target).map_err($crate::__private::anyhow::Error::msg)?;
				($apply)(target)
			},
		}
	};
}

/// Declares a post-initializer letting `$owner` observe `$target` in the second pass.
///
/// With `required`, the target becomes a requirement of the owner.
#[macro_export]
macro_rules! post_init {
	(@def $required:expr, $owner:ty, $target:path, $ty:ty, $apply:expr) => {
		$crate::PostInitDef {
			target: &$target,
			required: $required,
			apply: |owner, target| {
				let owner = $crate::downcast_mut::<$owner>(owner).map_err($crate::__private::anyhow::Error::msg)?;
				let target = $crate::downcast_mut::<$ty>(target).map_err($crate::__private::anyhow::Error::msg)?;
				($apply)(owner, target)
			},
		}
	};
	(required $owner:ty, $target:path : $ty:ty, $apply:expr) => {
		$crate::post_init!(@def true, $owner, $target, $ty, $apply)
	};
	($owner:ty, $target:path : $ty:ty, $apply:expr) => {
		$crate::post_init!(@def false, $owner, $target, $ty, $apply)
	};
}
